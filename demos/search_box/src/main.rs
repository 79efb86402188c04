use lull_core::*;
use lull_platform::{EventLoop, init_logging};

// Gaps between simulated keystrokes, in milliseconds. The long pauses are
// where a search should go out.
const TYPING: &[(char, u64)] = &[
    ('r', 0),
    ('u', 80),
    ('s', 60),
    ('t', 90),
    (' ', 450),
    ('t', 70),
    ('i', 50),
    ('m', 60),
    ('e', 80),
    ('r', 40),
];

fn main() -> anyhow::Result<()> {
    init_logging();

    let event_loop = EventLoop::new();
    event_loop.install();

    let query = signal(String::new());
    let search = use_debounced(query.clone(), 300)?;
    search.output().subscribe(|q: &String| {
        log::info!("search request: {q:?}");
    });

    let mut at = 0;
    for &(key, gap) in TYPING {
        at += gap;
        let query = query.clone();
        event_loop.schedule(Duration::from_millis(at), move || {
            query.update(|q| q.push(key));
            log::debug!("typed {key:?}");
        });
    }

    // Scroll events arrive every 16ms; analytics only wants one per 250ms.
    let scroll = ThrottledFn::new(event_loop.host(), 250, |offset: u32| {
        log::info!("scroll position reported: {offset}");
    })?;
    for frame in 0..60u32 {
        let scroll = scroll.clone();
        event_loop.schedule(Duration::from_millis(u64::from(frame) * 16), move || {
            scroll.call(frame * 12);
        });
    }

    let fired = event_loop.run_until_idle();
    log::info!("final query {:?} after {fired} timers", search.get());

    search.teardown();
    Ok(())
}
