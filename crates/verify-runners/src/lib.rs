//! Language runner implementations (C3): translate a [`VerificationJob`]
//! into a sandbox execution plan and parse the result back.
//!
//! Selection is a static match over [`RunnerKind`], not a runtime
//! registry -- each handler is a zero-sized stateless struct.

mod common;
mod julia;
mod lean;
mod python;
mod r;
mod symbolic;

pub use julia::JuliaRunner;
pub use lean::LeanRunner;
pub use python::PythonRunner;
pub use r::RRunner;
pub use symbolic::SymbolicRunner;

use verify_core::{Runner, RunnerKind};

/// Select the runner implementation for `kind`.
///
/// `PythonScript`/`PythonNotebook` and `RScript`/`RMarkdown` share a runner
/// that branches on `kind` internally (the wire format differs, the
/// language runtime doesn't); `Sympy`/`Sage` likewise share the Python
/// image. Every [`RunnerKind`] variant is covered -- there is no "unknown
/// kind" case to handle at this layer.
pub fn get_runner(kind: RunnerKind) -> &'static dyn Runner {
    match kind {
        RunnerKind::PythonScript | RunnerKind::PythonNotebook => &PythonRunner,
        RunnerKind::RScript | RunnerKind::RMarkdown => &RRunner,
        RunnerKind::Julia => &JuliaRunner,
        RunnerKind::Lean4 => &LeanRunner,
        RunnerKind::Sympy | RunnerKind::Sage => &SymbolicRunner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_runner_kind_resolves_to_a_runner() {
        for kind in [
            RunnerKind::PythonScript,
            RunnerKind::PythonNotebook,
            RunnerKind::RScript,
            RunnerKind::RMarkdown,
            RunnerKind::Julia,
            RunnerKind::Lean4,
            RunnerKind::Sympy,
            RunnerKind::Sage,
        ] {
            let _runner = get_runner(kind);
        }
    }
}
