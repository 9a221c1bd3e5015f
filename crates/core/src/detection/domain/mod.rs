pub mod detection;
pub mod object_detector;
