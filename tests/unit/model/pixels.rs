//! Tests for pixel buffer validation, access and shape checks

#[cfg(test)]
mod tests {
    use charpack::PackError;
    use charpack::model::pixels::{byte_len, rect_axis_slice};
    use charpack::model::{PixelBuffer, Rectangle};

    // Tests construction accepts exactly width * height * channels bytes
    // Verified by dropping the length check in PixelBuffer::new
    #[test]
    fn test_new_validates_length() {
        assert!(PixelBuffer::new(2, 3, 4, vec![0; 24]).is_ok());
        assert!(PixelBuffer::new(2, 3, 3, vec![0; 18]).is_ok());

        let result = PixelBuffer::new(2, 3, 4, vec![0; 23]);
        assert!(matches!(result, Err(PackError::InvalidPixelBuffer { .. })));
    }

    // Tests zero dimensions and unsupported channel counts are rejected
    // Verified by accepting any channel count
    #[test]
    fn test_new_rejects_bad_shape() {
        assert!(matches!(
            PixelBuffer::new(0, 3, 4, Vec::new()),
            Err(PackError::InvalidPixelBuffer { .. })
        ));
        assert!(matches!(
            PixelBuffer::new(2, 2, 2, vec![0; 8]),
            Err(PackError::InvalidPixelBuffer { .. })
        ));
        assert!(matches!(
            PixelBuffer::filled(2, 2, &[1, 2, 3, 4, 5]),
            Err(PackError::InvalidPixelBuffer { .. })
        ));
    }

    // Tests pixel lookup uses row-major interleaved addressing
    // Verified by swapping x and y in the offset calculation
    #[test]
    fn test_pixel_addressing() {
        let data: Vec<u8> = (0..24).collect();
        let buffer = PixelBuffer::new(3, 2, 4, data).expect("Failed to create buffer");

        assert_eq!(buffer.stride(), 12);
        assert_eq!(buffer.pixel(0, 0), Some(&[0, 1, 2, 3][..]));
        assert_eq!(buffer.pixel(2, 0), Some(&[8, 9, 10, 11][..]));
        assert_eq!(buffer.pixel(1, 1), Some(&[16, 17, 18, 19][..]));
        assert_eq!(buffer.pixel(3, 0), None);
        assert_eq!(buffer.pixel(0, 2), None);
    }

    // Tests fill_rect paints only the clipped rectangle
    // Verified by removing the clip so writes run past the right edge
    #[test]
    fn test_fill_rect_clips() {
        let mut buffer = crate::solid(4, 4, [0, 0, 0, 255]);
        buffer.fill_rect(Rectangle::new(2, 3, 10, 10), &[9, 9, 9, 9]);

        assert_eq!(buffer.pixel(2, 3), Some(&[9, 9, 9, 9][..]));
        assert_eq!(buffer.pixel(3, 3), Some(&[9, 9, 9, 9][..]));
        assert_eq!(buffer.pixel(1, 3), Some(&[0, 0, 0, 255][..]));
        assert_eq!(buffer.pixel(2, 2), Some(&[0, 0, 0, 255][..]));

        let before = buffer.clone();
        buffer.fill_rect(Rectangle::new(8, 8, 2, 2), &[1, 1, 1, 1]);
        assert_eq!(buffer, before);
    }

    // Tests shape comparison reports dimensions before channels
    // Verified by checking channels first
    #[test]
    fn test_ensure_same_shape() {
        let rgba = crate::solid(4, 4, [0; 4]);
        let wide = crate::solid(5, 4, [0; 4]);
        let rgb = PixelBuffer::filled(4, 4, &[0, 0, 0]).expect("Failed to create buffer");
        let wide_rgb = PixelBuffer::filled(5, 4, &[0, 0, 0]).expect("Failed to create buffer");

        assert!(rgba.ensure_same_shape(&rgba.clone()).is_ok());
        assert!(matches!(
            rgba.ensure_same_shape(&wide),
            Err(PackError::DimensionMismatch {
                expected: (4, 4),
                found: (5, 4)
            })
        ));
        assert!(matches!(
            rgba.ensure_same_shape(&rgb),
            Err(PackError::ChannelMismatch {
                expected: 4,
                found: 3
            })
        ));
        assert!(matches!(
            rgba.ensure_same_shape(&wide_rgb),
            Err(PackError::DimensionMismatch { .. })
        ));
    }

    // Tests the ndarray view is shaped (height, width, channels)
    // Verified by building the view as (width, height, channels)
    #[test]
    fn test_view_shape() {
        let data: Vec<u8> = (0..24).collect();
        let mut buffer = PixelBuffer::new(3, 2, 4, data).expect("Failed to create buffer");

        let view = buffer.view().expect("Failed to view buffer");
        assert_eq!(view.dim(), (2, 3, 4));
        assert_eq!(view.get([1, 1, 2]), Some(&18));

        if let Some(value) = buffer.view_mut().expect("Failed to view buffer").get_mut([0, 2, 0]) {
            *value = 200;
        }
        assert_eq!(buffer.pixel(2, 0), Some(&[200, 9, 10, 11][..]));
    }

    // Tests rect_axis_slice selects rows by y and columns by x, keeping every channel
    // Verified by swapping the row and column ranges
    #[test]
    fn test_rect_axis_slice() {
        let data: Vec<u8> = (0..48).collect();
        let buffer = PixelBuffer::new(4, 3, 4, data).expect("Failed to create buffer");
        let view = buffer.view().expect("Failed to view buffer");

        let rect = Rectangle::new(1, 0, 3, 2);
        let region = view.slice_each_axis(|axis| rect_axis_slice(rect, axis));

        assert_eq!(region.dim(), (2, 3, 4));
        assert_eq!(region.get([0, 0, 0]), Some(&4));
        assert_eq!(region.get([1, 2, 3]), Some(&31));
    }

    // Tests accessors and byte_len agree with the constructor arguments
    // Verified by returning channels from has_alpha for RGB buffers
    #[test]
    fn test_accessors() {
        let buffer = PixelBuffer::filled(5, 7, &[1, 2, 3]).expect("Failed to create buffer");

        assert_eq!(buffer.width(), 5);
        assert_eq!(buffer.height(), 7);
        assert_eq!(buffer.channels(), 3);
        assert!(!buffer.has_alpha());
        assert_eq!(buffer.bounds(), Rectangle::new(0, 0, 5, 7));
        assert_eq!(buffer.data().len(), byte_len(5, 7, 3));
        assert_eq!(buffer.into_data().len(), 105);
    }
}
