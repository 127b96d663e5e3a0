//! Built-in targets.

pub mod line;
pub mod sos;

pub use line::{
    CaptureWriter, ConsoleTarget, DebugConsoleTarget, DebugWriter, LineTarget, LineWriter,
    StdoutWriter,
};
pub use sos::SosTarget;
