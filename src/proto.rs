//! Ready-made rule construction for protocol buffer compilation.
//!
//! A thin convenience over [`FileSetRule`]: given `.proto` sources and
//! the files protoc will generate, build the full protoc command line.
//! The engine itself only ever sees the resulting sources/targets/
//! command triple.

use crate::rule::FileSetRule;

/// Builder for a protoc invocation.
///
/// Defaults: program `protoc`, output flag `--go_out=.`, a single
/// include path of `.`.
#[derive(Debug, Clone)]
pub struct Protoc {
    program: String,
    out_flag: Option<String>,
    include_dirs: Vec<String>,
    extra_args: Vec<String>,
}

impl Default for Protoc {
    fn default() -> Self {
        Self {
            program: "protoc".to_string(),
            out_flag: Some("--go_out=.".to_string()),
            include_dirs: vec![".".to_string()],
            extra_args: Vec::new(),
        }
    }
}

impl Protoc {
    /// A builder with the defaults above.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different protoc binary.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Replace the output flag, e.g. `--rust_out=src/pb`. `None`
    /// suppresses it entirely.
    #[must_use]
    pub fn with_out_flag(mut self, flag: Option<String>) -> Self {
        self.out_flag = flag;
        self
    }

    /// Add an import search path (`-I` flag).
    #[must_use]
    pub fn with_include(mut self, dir: impl Into<String>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    /// Append an arbitrary extra argument before the source list.
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Produce the rule compiling `sources` into `targets`.
    #[must_use]
    pub fn rule(&self, sources: Vec<String>, targets: Vec<String>) -> FileSetRule {
        let mut command = vec![self.program.clone()];
        if let Some(out) = &self.out_flag {
            command.push(out.clone());
        }
        for dir in &self.include_dirs {
            command.push(format!("-I{dir}"));
        }
        command.extend(self.extra_args.iter().cloned());
        command.extend(sources.iter().cloned());
        FileSetRule::new(sources, targets, command)
    }
}
