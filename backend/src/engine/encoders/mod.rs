mod batch;
mod ckks;
mod integer;

pub use batch::BatchEncoder;
pub use ckks::CkksEncoder;
pub use integer::IntegerEncoder;
