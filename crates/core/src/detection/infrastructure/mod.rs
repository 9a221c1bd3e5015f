pub mod class_filter_detector;
pub mod execution_provider;
pub mod onnx_yolo_detector;
