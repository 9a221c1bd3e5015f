use ndarray::{ArrayView3, ArrayViewMut3};

/// Channels in every decoded frame (packed RGB24).
pub const RGB_CHANNELS: u8 = 3;

/// A single decoded frame: contiguous RGB bytes in row-major order.
///
/// A frame is meant to be reused as the output buffer of a
/// [`FrameSource`](crate::video::domain::frame_source::FrameSource): the
/// source reshapes it with [`Frame::reshape`] and overwrites the pixels,
/// keeping the allocation alive across pulls.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// An empty 0x0 buffer, ready to be filled by a frame source.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resizes the pixel buffer for a frame of the given shape and stamps
    /// its stream index. Existing capacity is reused; pixel contents are
    /// left for the caller to overwrite.
    pub fn reshape(&mut self, width: u32, height: u32, channels: u8, index: usize) {
        let len = (width as usize) * (height as usize) * (channels as usize);
        self.data.resize(len, 0);
        self.width = width;
        self.height = height;
        self.channels = channels;
        self.index = index;
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    fn test_empty_frame_has_no_pixels() {
        let frame = Frame::empty();
        assert!(frame.is_empty());
        assert_eq!(frame.width(), 0);
        assert_eq!(frame.as_ndarray().shape(), &[0, 0, 0]);
    }

    #[test]
    fn test_reshape_grows_buffer_and_sets_index() {
        let mut frame = Frame::empty();
        frame.reshape(4, 2, RGB_CHANNELS, 7);
        assert_eq!(frame.data().len(), 24);
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.index(), 7);
    }

    #[test]
    fn test_reshape_keeps_capacity_when_shrinking() {
        let mut frame = Frame::new(vec![1u8; 48], 4, 4, 3, 0);
        let capacity = frame.data.capacity();
        frame.reshape(2, 2, 3, 1);
        assert_eq!(frame.data().len(), 12);
        assert_eq!(frame.data.capacity(), capacity);
    }

    #[test]
    fn test_clone_is_independent() {
        let data = vec![100u8; 12];
        let frame = Frame::new(data, 2, 2, 3, 0);
        let mut cloned = frame.clone();
        cloned.data_mut()[0] = 0;
        assert_eq!(frame.data()[0], 100);
        assert_eq!(cloned.data()[0], 0);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        let data = vec![0u8; 10]; // wrong size for 2x2x3
        Frame::new(data, 2, 2, 3, 0);
    }

    #[test]
    fn test_as_ndarray_pixel_access() {
        // 2x2 RGB: set pixel (row=1, col=0) to red
        let mut data = vec![0u8; 12];
        data[6] = 255;
        let frame = Frame::new(data, 2, 2, 3, 0);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 2, 3]);
        assert_eq!(arr[[1, 0, 0]], 255);
        assert_eq!(arr[[1, 0, 1]], 0);
    }

    #[test]
    fn test_as_ndarray_mut_modification() {
        let mut frame = Frame::new(vec![0u8; 12], 2, 2, 3, 0);
        {
            let mut arr = frame.as_ndarray_mut();
            arr[[0, 1, 2]] = 128;
        }
        assert_eq!(frame.as_ndarray()[[0, 1, 2]], 128);
    }
}
