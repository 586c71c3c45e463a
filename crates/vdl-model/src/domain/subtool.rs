use std::fmt;

/// The subordinate binaries driven by the launcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subtool {
    /// Builds the device configuration and prints it on stdout.
    Assembler,
    /// Boots one device instance from the configuration read on stdin.
    Runner,
}

impl Subtool {
    /// File name of the binary on disk.
    pub fn binary_name(&self) -> &'static str {
        match self {
            Subtool::Assembler => "assemble_cvd",
            Subtool::Runner => "run_cvd",
        }
    }

    /// Short identifier for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Subtool::Assembler => "assembler",
            Subtool::Runner => "runner",
        }
    }
}

impl fmt::Display for Subtool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary_name())
    }
}
