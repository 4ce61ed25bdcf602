mod errors;
mod extraction;
mod samples;
