//! Plain-text rendering of snapshots and forecasts. All rounding happens here.

use std::fmt::Write;

use crate::calendar::weekday_name;
use crate::pipeline::Forecast;
use crate::weather::WeatherSnapshot;

/// Weather panel shown next to every forecast.
pub fn render_snapshot(snapshot: &WeatherSnapshot) -> String {
    let aqi = snapshot
        .aqi
        .map(|v| v.to_string())
        .unwrap_or_else(|| "unavailable".to_string());

    let mut out = String::new();
    let _ = writeln!(out, "Weather Snapshot");
    let _ = writeln!(out, "  Temperature:   {} °F", snapshot.temp);
    let _ = writeln!(out, "  Condition:     {}", snapshot.conditions);
    let _ = writeln!(out, "  Humidity:      {}%", snapshot.humidity);
    let _ = writeln!(out, "  Cloud Cover:   {}%", snapshot.cloud_cover);
    let _ = writeln!(out, "  Rain (recent): {} mm", snapshot.precip);
    let _ = writeln!(out, "  High Temp:     {} °F", snapshot.temp_max);
    let _ = writeln!(out, "  Low Temp:      {} °F", snapshot.temp_min);
    let _ = writeln!(out, "  Rain Chance:   {:.0}%", snapshot.precip_probability);
    let _ = writeln!(out, "  Air Quality:   {}", aqi);
    out
}

/// Prediction and staffing targets.
pub fn render_forecast(forecast: &Forecast) -> String {
    let m = &forecast.metrics;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} Predictions ({})",
        forecast.site.name,
        weekday_name(forecast.calendar.day_of_week)
    );
    let _ = writeln!(out);
    out.push_str(&render_snapshot(&forecast.snapshot));
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Predicted Car Count: {} cars",
        m.predicted_count.trunc() as i64
    );
    let _ = writeln!(out, "Predicted Potential Members: {:.0} cars", m.members);
    let _ = writeln!(out, "Conversion Goal: {:.0} new members", m.conversion_goal);
    let _ = writeln!(
        out,
        "Greeters should aim for {:.0} new members per hour",
        m.greeter_hourly_target
    );
    if let Some(full_service) = m.full_service {
        let _ = writeln!(out, "Predicted Full Service washes: {:.0} cars", full_service);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Recommended Shift Split for Greeters");
    let _ = writeln!(
        out,
        "  Opening Greeter team:     {:.0} new members",
        m.greeter_split.per_shift
    );
    let _ = writeln!(
        out,
        "  Closing Greeter team:     {:.0} new members",
        m.greeter_split.per_shift
    );
    let _ = writeln!(
        out,
        "  Sales Supervisor/Manager: {:.0} new members",
        m.greeter_split.supervisor
    );
    out
}
