//! Transform passes
//!
//! Every plugin is a [`Pass`]; presets are named, ordered lists of plugins.
//! A [`Pipeline`] resolves a [`TransformConfig`] into the passes to run.
//!
//! # Adding a New Plugin
//!
//! 1. Create a new file in `passes/`
//! 2. Implement `Pass` for your struct
//! 3. Register it in `create_pass()` and `PLUGINS`

mod arrow_functions;
mod modules_commonjs;
mod react_inline_elements;
mod react_jsx;
mod shorthand_properties;
mod syntax;
mod template_literals;

pub use arrow_functions::ArrowFunctions;
pub use modules_commonjs::ModulesCommonJs;
pub use react_inline_elements::ReactInlineElements;
pub use react_jsx::ReactJsx;
pub use shorthand_properties::ShorthandProperties;
pub use syntax::SyntaxPlugin;
pub use template_literals::TemplateLiterals;

use std::collections::HashSet;

use tracing::debug;

use crate::error::TransformError;
use crate::executor::types::ast::Module;

use super::gate::Syntax;
use super::names::NameGenerator;
use super::TransformConfig;

// ============================================================================
// Pass Trait
// ============================================================================

/// A single AST-to-AST rewrite
pub trait Pass {
    /// Registry name (e.g. "transform-arrow-functions")
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Experimental syntax this pass makes legal
    fn enables(&self) -> &'static [Syntax] {
        &[]
    }

    fn apply(&self, module: &mut Module, cx: &mut PassContext);
}

/// State shared by the passes of one transform
pub struct PassContext {
    names: NameGenerator,
}

impl PassContext {
    pub fn new(module: &Module) -> Self {
        Self {
            names: NameGenerator::for_module(module),
        }
    }

    /// Fresh binding name that collides with nothing in the module
    pub fn uid(&mut self, hint: &str) -> String {
        self.names.generate(hint)
    }
}

// ============================================================================
// Registry
// ============================================================================

/// A named bundle of plugins
#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub plugins: &'static [&'static str],
}

pub const PRESETS: &[Preset] = &[
    Preset {
        name: "es2015",
        description: "Lower ES2015 syntax and modules to CommonJS",
        plugins: &[
            "transform-template-literals",
            "transform-shorthand-properties",
            "transform-arrow-functions",
            "transform-modules-commonjs",
        ],
    },
    Preset {
        name: "stage-1",
        description: "Allow nullish coalescing and optional chaining",
        plugins: &["syntax-nullish-coalescing", "syntax-optional-chaining"],
    },
    Preset {
        name: "react",
        description: "Allow JSX and lower it to React.createElement calls",
        plugins: &["syntax-jsx", "transform-react-jsx"],
    },
];

/// Every plugin name the registry knows
pub const PLUGINS: &[&str] = &[
    "syntax-jsx",
    "syntax-nullish-coalescing",
    "syntax-optional-chaining",
    "transform-template-literals",
    "transform-shorthand-properties",
    "transform-arrow-functions",
    "transform-modules-commonjs",
    "transform-react-jsx",
    "transform-react-inline-elements",
];

pub fn create_pass(name: &str) -> Option<Box<dyn Pass>> {
    let pass: Box<dyn Pass> = match name {
        "syntax-jsx" => Box::new(SyntaxPlugin::new(
            "syntax-jsx",
            "Allow parsing of JSX",
            &[Syntax::Jsx],
        )),
        "syntax-nullish-coalescing" => Box::new(SyntaxPlugin::new(
            "syntax-nullish-coalescing",
            "Allow parsing of the ?? operator",
            &[Syntax::NullishCoalescing],
        )),
        "syntax-optional-chaining" => Box::new(SyntaxPlugin::new(
            "syntax-optional-chaining",
            "Allow parsing of ?. member access and calls",
            &[Syntax::OptionalChaining],
        )),
        "transform-template-literals" => Box::new(TemplateLiterals),
        "transform-shorthand-properties" => Box::new(ShorthandProperties),
        "transform-arrow-functions" => Box::new(ArrowFunctions),
        "transform-modules-commonjs" => Box::new(ModulesCommonJs),
        "transform-react-jsx" => Box::new(ReactJsx),
        "transform-react-inline-elements" => Box::new(ReactInlineElements),
        _ => return None,
    };
    Some(pass)
}

pub fn find_preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name == name)
}

/// Accept `babel-plugin-x` / `babel-preset-x` spellings as well as `x`
fn normalize<'a>(name: &'a str, prefix: &str) -> &'a str {
    let name = name.trim();
    name.strip_prefix(prefix).unwrap_or(name)
}

// ============================================================================
// Pipeline
// ============================================================================

/// Resolved, ordered passes for one configuration
pub struct Pipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl Pipeline {
    /// Plugins first in listed order, then presets in reverse listed order
    pub fn resolve(config: &TransformConfig) -> Result<Self, TransformError> {
        let mut ordered: Vec<&'static str> = Vec::new();

        let mut seen = HashSet::new();
        for raw in &config.plugins {
            let name = normalize(raw, "babel-plugin-");
            if !seen.insert(name) {
                return Err(TransformError::Config(format!("Duplicate plugin '{}'", name)));
            }
            let known = PLUGINS
                .iter()
                .copied()
                .find(|p| *p == name)
                .ok_or_else(|| TransformError::Config(format!("Unknown plugin '{}'", raw)))?;
            ordered.push(known);
        }

        let mut seen = HashSet::new();
        for raw in config.presets.iter().rev() {
            let name = normalize(raw, "babel-preset-");
            if !seen.insert(name) {
                return Err(TransformError::Config(format!("Duplicate preset '{}'", name)));
            }
            let preset = find_preset(name)
                .ok_or_else(|| TransformError::Config(format!("Unknown preset '{}'", raw)))?;
            ordered.extend(preset.plugins.iter().copied());
        }

        let mut applied = HashSet::new();
        let mut passes = Vec::new();
        for name in ordered {
            if !applied.insert(name) {
                continue;
            }
            let pass = create_pass(name).ok_or_else(|| {
                TransformError::Config(format!("Plugin '{}' is not registered", name))
            })?;
            passes.push(pass);
        }

        Ok(Self { passes })
    }

    pub fn enables(&self, syntax: Syntax) -> bool {
        self.passes.iter().any(|p| p.enables().contains(&syntax))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    pub fn apply(&self, module: &mut Module, cx: &mut PassContext) {
        for pass in &self.passes {
            debug!(pass = pass.name(), "Applying pass");
            pass.apply(module, cx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(presets: &[&str], plugins: &[&str]) -> TransformConfig {
        TransformConfig {
            presets: presets.iter().map(|s| s.to_string()).collect(),
            plugins: plugins.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_default_order_runs_presets_in_reverse() {
        let pipeline = Pipeline::resolve(&TransformConfig::default()).unwrap();
        assert_eq!(
            pipeline.names(),
            vec![
                "syntax-jsx",
                "transform-react-jsx",
                "syntax-nullish-coalescing",
                "syntax-optional-chaining",
                "transform-template-literals",
                "transform-shorthand-properties",
                "transform-arrow-functions",
                "transform-modules-commonjs",
            ]
        );
    }

    #[test]
    fn test_plugins_run_before_presets_and_dedupe() {
        let pipeline = Pipeline::resolve(&config(
            &["es2015"],
            &["transform-react-inline-elements", "transform-arrow-functions"],
        ))
        .unwrap();
        assert_eq!(
            pipeline.names(),
            vec![
                "transform-react-inline-elements",
                "transform-arrow-functions",
                "transform-template-literals",
                "transform-shorthand-properties",
                "transform-modules-commonjs",
            ]
        );
    }

    #[test]
    fn test_prefixed_names_are_accepted() {
        let pipeline =
            Pipeline::resolve(&config(&["babel-preset-react"], &["babel-plugin-syntax-jsx"]))
                .unwrap();
        assert!(pipeline.enables(Syntax::Jsx));
        assert!(!pipeline.enables(Syntax::OptionalChaining));
    }

    #[test]
    fn test_unknown_and_duplicate_entries_are_config_errors() {
        assert_eq!(
            Pipeline::resolve(&config(&["es2017"], &[])).err().unwrap(),
            TransformError::Config("Unknown preset 'es2017'".to_string())
        );
        assert_eq!(
            Pipeline::resolve(&config(&[], &["transform-classes"])).err().unwrap(),
            TransformError::Config("Unknown plugin 'transform-classes'".to_string())
        );
        assert_eq!(
            Pipeline::resolve(&config(&["react", "babel-preset-react"], &[])).err().unwrap(),
            TransformError::Config("Duplicate preset 'react'".to_string())
        );
    }

    #[test]
    fn test_every_plugin_is_registered() {
        for name in PLUGINS {
            let pass = create_pass(name).unwrap();
            assert_eq!(pass.name(), *name);
        }
        for preset in PRESETS {
            for plugin in preset.plugins {
                assert!(PLUGINS.contains(plugin));
            }
        }
    }
}
