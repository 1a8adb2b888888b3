//! Tests for batch progress tracking

#[cfg(test)]
mod tests {
    use charpack::io::configuration::MIN_PROGRESS_ITEMS;
    use charpack::io::progress::ProgressManager;

    // Tests a disabled manager still counts items without drawing
    // Verified by only counting when visible
    #[test]
    fn test_disabled_progress_counts() {
        let mut progress = ProgressManager::new(5, "Loading", false);

        assert!(!progress.is_visible());
        progress.advance("a");
        progress.advance("b");
        assert_eq!(progress.completed(), 2);
        progress.finish();
    }

    // Tests small batches stay hidden even when enabled
    // Verified by ignoring MIN_PROGRESS_ITEMS
    #[test]
    fn test_small_batches_hidden() {
        let progress = ProgressManager::new(MIN_PROGRESS_ITEMS - 1, "Loading", true);

        assert!(!progress.is_visible());
    }

    // Tests an enabled manager draws a bar for larger batches
    // Verified by never creating the bar
    #[test]
    fn test_enabled_progress_visible() {
        let mut progress = ProgressManager::new(MIN_PROGRESS_ITEMS + 1, "Differencing", true);

        assert!(progress.is_visible());
        progress.advance("hero_idle");
        assert_eq!(progress.completed(), 1);
        progress.finish();
    }
}
