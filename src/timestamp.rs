use std::time::Duration;

/// Formats an elapsed wall-clock time as `[h:]mm:ss.mmm`.
pub fn elapsed_str(elapsed: Duration) -> String {
    let ms = elapsed.as_millis();
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let milliseconds = ms % 1000;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}.{milliseconds:03}")
    } else {
        format!("{minutes:02}:{seconds:02}.{milliseconds:03}")
    }
}

#[test]
fn formats_elapsed() {
    assert_eq!(elapsed_str(Duration::from_millis(1234)), "00:01.234");
    assert_eq!(elapsed_str(Duration::from_secs(3 * 3600 + 61)), "3:01:01.000");
}
