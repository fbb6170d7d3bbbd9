//! Syntax-only plugins: enable experimental syntax without rewriting it

use crate::executor::types::ast::Module;
use crate::transform::gate::Syntax;

use super::{Pass, PassContext};

pub struct SyntaxPlugin {
    name: &'static str,
    description: &'static str,
    enables: &'static [Syntax],
}

impl SyntaxPlugin {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        enables: &'static [Syntax],
    ) -> Self {
        Self {
            name,
            description,
            enables,
        }
    }
}

impl Pass for SyntaxPlugin {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn enables(&self) -> &'static [Syntax] {
        self.enables
    }

    fn apply(&self, _module: &mut Module, _cx: &mut PassContext) {}
}
