//! Test helpers for executor tests
//!
//! Common utilities for parsing programs and running them on a VM

use crate::executor::builtins::{intrinsics, Builtin};
use crate::executor::types::{Env, Stmt, VarKind};
use crate::executor::{run_until_done, Control, Limits, Runtime, Val, VM};
use crate::parser::parse_module;
use crate::sandbox::{SandboxResolver, ScopeMapping};

/// Parse `source` and run it to completion with an empty scope
///
/// Nothing is lowered first, so programs reach the scope through `require`
/// directly rather than through `import`.
pub fn run_program(source: &str) -> VM {
    run_program_with(source, &ScopeMapping::new(), Limits::default())
}

/// Parse `source` and run it against `scope` under `limits`
///
/// # Returns
/// The finished VM; inspect `vm.control` and `vm.completion`
pub fn run_program_with(source: &str, scope: &ScopeMapping, limits: Limits) -> VM {
    let module = parse_module(source).expect("Parse failed");

    let root = Env::root();
    for (name, value) in intrinsics() {
        root.declare(name, value, VarKind::Const);
    }
    let env = root.child();
    env.declare(
        "require",
        Val::Func {
            func: Builtin::Require,
            bindings: vec![],
        },
        VarKind::Const,
    );

    let program = Stmt::Block {
        body: module.body,
        span: module.span,
    };
    let resolver = SandboxResolver::new(scope);
    let mut rt = Runtime::new(&resolver, limits);
    let mut vm = VM::new(program, env);
    run_until_done(&mut vm, &mut rt);
    vm
}

/// Value of the last expression statement of a program that must finish normally
pub fn completion(source: &str) -> Val {
    let vm = run_program(source);
    assert_eq!(
        vm.control,
        Control::None,
        "Program did not complete normally"
    );
    vm.completion.unwrap_or(Val::Undefined)
}

pub fn num_list(items: &[f64]) -> Val {
    Val::list(items.iter().map(|n| Val::Num(*n)).collect())
}
