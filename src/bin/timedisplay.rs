//! Pretty-prints an elapsed `time::Duration` as `HHh MMm SSs`, the format
//! printed after a run finishes.

use time::Duration;

pub fn pretty_print_duration(d: Duration) -> String {
    let total_seconds = d.num_seconds().max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}h {:02}m {:02}s", hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_whole_minutes_and_seconds() {
        let d = Duration::seconds(3725);
        assert_eq!(pretty_print_duration(d), "01h 02m 05s");
    }
}
