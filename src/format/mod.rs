/// Static table of supported output formats.
pub mod registry;
