//! Recast Codegen
//!
//! Target transformers and emitters for the recast pipeline. Consumes the IL
//! tree produced by `recast-compiler` and renders target source text.

pub mod basic;
pub mod heuristics;
pub mod python;
pub mod session;
pub mod stubs;

use recast_core::diag::Warning;
use recast_core::il::IlModule;
use recast_core::options::TargetOptions;
use recast_core::source::SourceModule;
use session::TranspileSession;

/// The result of one transpile invocation: target text plus every warning
/// the pipeline accumulated. There is no failure variant; unsupported input
/// degrades to placeholders and warnings.
#[derive(Debug, Clone)]
pub struct Transpiled {
    pub text: String,
    pub warnings: Vec<Warning>,
}

/// Render an already-normalized IL module for the configured dialect.
pub fn generate(il: &IlModule, options: &TargetOptions) -> Transpiled {
    let mut session = TranspileSession::new(options.clone());
    let text = if session.options.dialect.is_basic() {
        let module = basic::transform(il, &mut session);
        let mut emitter = basic::BasicEmitter::new(&session);
        emitter.emit_module(&module)
    } else {
        let module = python::transform(il, &mut session);
        let emitter = python::PyEmitter::new(&session);
        emitter.emit_module(&module)
    };
    Transpiled {
        text,
        warnings: session.warnings.into_vec(),
    }
}

/// One-call entry: normalize a Source module and emit it for the configured
/// dialect. Normalizer warnings precede transformer warnings in the result.
pub fn transpile(source: &SourceModule, options: &TargetOptions) -> Transpiled {
    let (il, warnings) = recast_compiler::normalize(source);
    let mut out = generate(&il, options);
    let mut all = warnings.into_vec();
    all.extend(std::mem::take(&mut out.warnings));
    out.warnings = all;
    out
}
