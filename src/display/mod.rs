pub mod decode;
pub mod element;
pub mod runtime;
