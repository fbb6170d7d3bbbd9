//! Validation Rules
//!
//! Each file in this module contains one validation rule:
//!
//! - `module_item_placement.rs` - import/export below the top level
//! - `return_outside_function.rs` - `return` with no enclosing function
//! - `loop_control.rs` - `break`/`continue` with no enclosing loop
//! - `duplicate_declaration.rs` - a name declared twice in one scope
//! - `undefined_export.rs` - `export { x }` for an undeclared `x`
//! - `unused_import.rs` - imported bindings nothing reads (warning)

mod duplicate_declaration;
mod loop_control;
mod module_item_placement;
mod return_outside_function;
mod undefined_export;
mod unused_import;

pub use duplicate_declaration::DuplicateDeclarationRule;
pub use loop_control::LoopControlRule;
pub use module_item_placement::ModuleItemPlacementRule;
pub use return_outside_function::ReturnOutsideFunctionRule;
pub use undefined_export::UndefinedExportRule;
pub use unused_import::UnusedImportRule;
