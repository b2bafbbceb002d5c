//! Plain-text rendering of the dashboard.
//!
//! Icons are drawn as a small swatch of their average colour when the
//! terminal supports 24-bit colour, and omitted otherwise.

use std::fmt::Write;

use weatherdash_weather::IconImage;

use crate::models::{CurrentPanel, DashboardModel, ForecastCard};

const TITLE: &str = "Weather Dashboard";
const FORECAST_HEADING: &str = "5-Day Forecast";
const SEARCHING: &str = "Searching…";
const SWATCH: &str = "██";

/// Render the whole dashboard. `color` enables ANSI truecolor icon swatches.
pub fn render(model: &DashboardModel, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", TITLE);
    let _ = writeln!(out, "{}", "=".repeat(TITLE.chars().count()));

    if model.is_loading() {
        let _ = writeln!(out, "{} {}", SEARCHING, model.last_query());
    }

    render_current(&mut out, model.current(), color);

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", FORECAST_HEADING);
    for card in model.forecast().iter().filter(|c| !c.is_empty()) {
        render_card(&mut out, card, color);
    }
    out
}

fn render_current(out: &mut String, panel: &CurrentPanel, color: bool) {
    if panel.location.is_empty() {
        let _ = writeln!(out, "No location selected");
        return;
    }

    let _ = writeln!(out, "{}", panel.location);
    let _ = writeln!(
        out,
        "{}{}  {}",
        icon_prefix(panel.icon.as_ref(), color),
        panel.temperature,
        panel.description
    );
    let _ = writeln!(out, "{}  {}", panel.humidity, panel.wind);
}

fn render_card(out: &mut String, card: &ForecastCard, color: bool) {
    let _ = writeln!(
        out,
        "{:<10} {:<7} {}{:>8}  {}",
        card.day_name,
        card.date,
        icon_prefix(card.icon.as_ref(), color),
        card.temperature,
        card.description
    );
}

fn icon_prefix(icon: Option<&IconImage>, color: bool) -> String {
    if !color {
        return String::new();
    }
    match icon.and_then(IconImage::average_color) {
        Some([r, g, b]) => format!("\x1b[38;2;{};{};{}m{}\x1b[0m ", r, g, b, SWATCH),
        None => "   ".to_string(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use std::io::Cursor;

    use chrono::NaiveDate;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use weatherdash_weather::{CurrentConditions, DailyForecast, Units};

    use crate::services::{CurrentSnapshot, ForecastSnapshot, WeatherServiceMessage, WeatherUpdate};

    fn red_icon() -> IconImage {
        let img = RgbaImage::from_pixel(2, 2, Rgba([200, 10, 10, 255]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        IconImage::decode(&bytes).unwrap()
    }

    fn populated() -> DashboardModel {
        let mut model = DashboardModel::new(Units::Metric);
        model.expect_generation(1);
        model.handle_message(WeatherServiceMessage::FetchDone {
            generation: 1,
            result: Ok(WeatherUpdate {
                query: "Oslo".to_string(),
                current: Some(CurrentSnapshot {
                    conditions: CurrentConditions {
                        city: "Oslo".to_string(),
                        country: "NO".to_string(),
                        temperature: -2.5,
                        description: "snow".to_string(),
                        humidity: 90,
                        wind_speed: 3.0,
                        icon_id: "13d".to_string(),
                    },
                    icon: Some(red_icon()),
                }),
                forecast: Some(vec![ForecastSnapshot {
                    day: DailyForecast {
                        date: NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
                        temperature: 1.0,
                        icon_id: "13d".to_string(),
                        description: "light snow".to_string(),
                    },
                    icon: Some(red_icon()),
                }]),
            }),
        });
        model
    }

    #[test]
    fn test_empty_dashboard() {
        let model = DashboardModel::new(Units::Metric);
        let text = render(&model, false);

        assert!(text.starts_with("Weather Dashboard\n"));
        assert!(text.contains("No location selected"));
        assert!(text.contains("5-Day Forecast"));
        assert!(!text.contains("Searching"));
    }

    #[test]
    fn test_populated_dashboard() {
        let model = populated();
        let text = render(&model, false);

        assert!(text.contains("Oslo, NO"));
        assert!(text.contains("-2.5°C  Snow"));
        assert!(text.contains("Humidity: 90%  Wind: 3.0 m/s"));
        assert!(text.contains("Wednesday"));
        assert!(text.contains("Mar 20"));
        assert!(text.contains("Light snow"));
        assert!(!text.contains("\x1b["));
    }

    #[test]
    fn test_color_swatches() {
        let model = populated();
        let text = render(&model, true);

        assert!(text.contains("\x1b[38;2;200;10;10m"));
    }

    #[test]
    fn test_missing_icon_without_color_renders_nothing() {
        assert_eq!(icon_prefix(None, false), "");
        assert_eq!(icon_prefix(None, true), "   ");
    }
}
