pub mod samples;
pub mod stream;

pub use samples::SampleSet;
pub use stream::{read_inference_records, read_training_samples, write_outputs, SampleError};
