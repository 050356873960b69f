pub mod decode;

pub use decode::{decode, decode_file, detect_format, AudioFormat};
