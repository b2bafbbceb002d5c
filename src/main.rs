use std::io::BufRead;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use anyhow::Result;
use weatherdash_ui::{render, AppServices, DashboardModel};

/// How often the loop checks for finished searches while waiting on input
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Upper bound on waiting for the last search after stdin closes
const EXIT_WAIT: Duration = Duration::from_secs(15);

fn main() -> Result<()> {
    weatherdash_core::init()?;

    let mut app = weatherdash_core::App::new()?;

    let services = AppServices::new(&app.config().weather)?;
    let color = app.config().ui.color;
    let mut model = DashboardModel::new(services.units());

    tracing::info!("WeatherDash started");

    let initial = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if model.search(&services, &initial) {
        print!("{}", render(&model, color));
    } else {
        println!("Enter a city name to search.");
    }

    let (line_tx, line_rx) = mpsc::channel::<String>();
    std::thread::Builder::new()
        .name("weatherdash-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if line_tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
        })?;

    loop {
        match line_rx.recv_timeout(POLL_INTERVAL) {
            Ok(line) => {
                if model.search(&services, &line) {
                    print!("{}", render(&model, color));
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                if model.wait_for_pending(&services, EXIT_WAIT) {
                    print!("{}", render(&model, color));
                }
                break;
            }
        }

        if model.poll(&services) {
            print!("{}", render(&model, color));
        }
    }

    services.shutdown();
    app.shutdown()?;

    Ok(())
}
