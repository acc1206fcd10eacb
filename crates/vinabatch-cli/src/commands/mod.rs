pub mod dock;
pub mod parse;
