//! Job progress arithmetic.
//!
//! The percentage is derived from page/panel position only, so it is
//! non-decreasing under the strictly sequential generation loop. It is
//! capped below 100 while a job runs; only completion reports 100.

/// Percentage reported for a completed job.
pub const PERCENT_COMPLETE: u8 = 100;

/// Highest percentage a running job may report.
pub const PERCENT_RUNNING_CAP: u8 = 99;

/// Completion percentage after finishing `current_panel` of
/// `total_panels` on `current_page` of `total_pages`.
///
/// `floor(100 * ((current_page - 1) / total_pages
///             + (current_panel / total_panels) / total_pages))`,
/// clamped to [`PERCENT_RUNNING_CAP`]. Zero totals contribute nothing
/// rather than dividing by zero.
pub fn completion_percent(
    current_page: u32,
    total_pages: u32,
    current_panel: u32,
    total_panels: u32,
) -> u8 {
    if total_pages == 0 {
        return 0;
    }
    let page_fraction = f64::from(current_page.saturating_sub(1)) / f64::from(total_pages);
    let panel_fraction = if total_panels == 0 {
        0.0
    } else {
        f64::from(current_panel) / f64::from(total_panels) / f64::from(total_pages)
    };
    let percent = (100.0 * (page_fraction + panel_fraction)).floor();
    (percent as u8).min(PERCENT_RUNNING_CAP)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_page_progresses_by_panel() {
        assert_eq!(completion_percent(1, 1, 0, 3), 0);
        assert_eq!(completion_percent(1, 1, 1, 3), 33);
        assert_eq!(completion_percent(1, 1, 2, 3), 66);
        // The full page would be 100; running jobs cap at 99.
        assert_eq!(completion_percent(1, 1, 3, 3), PERCENT_RUNNING_CAP);
    }

    #[test]
    fn later_pages_start_past_earlier_pages() {
        assert_eq!(completion_percent(2, 4, 0, 5), 25);
        assert_eq!(completion_percent(3, 4, 0, 5), 50);
        assert_eq!(completion_percent(4, 4, 5, 5), PERCENT_RUNNING_CAP);
    }

    #[test]
    fn never_decreases_across_a_run() {
        let pages = 3u32;
        let panels = [4u32, 2, 7];
        let mut last = 0u8;
        for (page_index, panel_count) in panels.iter().enumerate() {
            for panel in 0..=*panel_count {
                let percent =
                    completion_percent(page_index as u32 + 1, pages, panel, *panel_count);
                assert!(
                    percent >= last,
                    "percent regressed from {last} to {percent} at page {} panel {panel}",
                    page_index + 1
                );
                last = percent;
            }
        }
    }

    #[test]
    fn zero_totals_are_safe() {
        assert_eq!(completion_percent(0, 0, 0, 0), 0);
        assert_eq!(completion_percent(1, 2, 0, 0), 0);
        assert_eq!(completion_percent(2, 2, 0, 0), 50);
    }

    #[test]
    fn running_percent_never_reaches_complete() {
        for page in 1..=4u32 {
            for panel in 0..=6u32 {
                assert!(completion_percent(page, 4, panel, 6) < PERCENT_COMPLETE);
            }
        }
    }
}
