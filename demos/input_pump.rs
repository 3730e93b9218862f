// Platform threads feed synthetic input events into a 60 Hz game loop.
//
// cargo run --example input_pump
// RUST_LOG=mtq_events=trace cargo run --example input_pump

use mtq_events::ChannelBuilder;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Clone, Debug, Default)]
enum InputEvent {
    #[default]
    None,
    Key { code: u32, down: bool },
    Pointer { x: f32, y: f32 },
    Text(String),
}

const FRAME: Duration = Duration::from_micros(16_667);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
        })
        .expect("Error setting Ctrl-C handler");
    }

    let (tx, mut rx) = ChannelBuilder::new()
        .with_prefill(256)
        .build::<InputEvent>()
        .expect("channel configuration");
    let pushed = Arc::new(AtomicU64::new(0));

    let keyboard = {
        let (tx, running, pushed) = (tx.clone(), Arc::clone(&running), Arc::clone(&pushed));
        thread::spawn(move || {
            let mut code = 0u32;
            while running.load(Ordering::Relaxed) {
                code = (code + 1) % 128;
                tx.push(&InputEvent::Key { code, down: true });
                tx.push(&InputEvent::Key { code, down: false });
                if code % 16 == 0 {
                    tx.push(&InputEvent::Text(format!("char {code}")));
                }
                pushed.fetch_add(2 + u64::from(code % 16 == 0), Ordering::Relaxed);
                thread::sleep(Duration::from_millis(fastrand::u64(1..8)));
            }
        })
    };

    let pointer = {
        let (tx, running, pushed) = (tx.clone(), Arc::clone(&running), Arc::clone(&pushed));
        thread::spawn(move || {
            let mut t = 0f32;
            while running.load(Ordering::Relaxed) {
                t += 0.01;
                tx.push(&InputEvent::Pointer {
                    x: t.cos() * 100.0,
                    y: t.sin() * 100.0,
                });
                pushed.fetch_add(1, Ordering::Relaxed);
                thread::sleep(Duration::from_micros(500));
            }
        })
    };
    drop(tx);

    let started = Instant::now();
    let mut frames = 0u64;
    let mut handled = 0u64;
    let mut event = InputEvent::default();

    info!("game loop running, press Ctrl-C to stop");
    while running.load(Ordering::Relaxed) {
        let frame_start = Instant::now();
        while rx.pop_into(Some(&mut event)) {
            handled += 1;
            if let InputEvent::Text(text) = &event {
                tracing::debug!(%text, "text input");
            }
        }
        frames += 1;
        if frames % 60 == 0 {
            info!(
                frames,
                handled,
                live_chunks = rx.live_chunks(),
                recycled = rx.recycled_nodes(),
                "frame stats"
            );
        }
        if let Some(rest) = FRAME.checked_sub(frame_start.elapsed()) {
            thread::sleep(rest);
        }
    }

    keyboard.join().expect("keyboard thread panicked");
    pointer.join().expect("pointer thread panicked");
    handled += rx.drain(|_| {}) as u64;

    println!(
        "{} frames in {:.1?}: {} events pushed, {} handled",
        frames,
        started.elapsed(),
        pushed.load(Ordering::Relaxed),
        handled
    );
    println!("{:?}", rx);
}
