// Audio processing (DSP)
// Modules: decoder, frame, mel, mfcc

pub mod decoder;
pub mod frame;
pub mod mel;
pub mod mfcc;
