//! Installs the hook with a pass-through engine and logs every notification.
//! Useful for checking shortcut detection against a real keyboard.

#[cfg(windows)]
fn main() -> anyhow::Result<()> {
    use retype_core::context::HookContext;
    use retype_core::engine::NullEngine;
    use retype_core::foreground::ProcessProbe;
    use retype_core::interceptor::KeyInterceptor;
    use retype_core::keyboard_hook::{self, AsyncKeyState, SendInputSink};
    use std::sync::Arc;

    tracing_subscriber::fmt::init();

    println!("Starting hook test...");
    println!("Press Ctrl+Space (toggle) or Esc (restore); close the console to stop.");

    let ctx = Arc::new(HookContext::new(Box::new(ProcessProbe)));
    let rx = ctx.subscribe();
    let interceptor = KeyInterceptor::new(
        ctx,
        Box::new(NullEngine),
        Box::new(AsyncKeyState),
        Box::new(SendInputSink),
    );

    keyboard_hook::start(interceptor)?;

    std::thread::spawn(move || {
        for n in rx {
            println!("notification: {:?}", n);
        }
    });

    keyboard_hook::run_event_loop();
    keyboard_hook::stop();
    Ok(())
}

#[cfg(not(windows))]
fn main() {
    eprintln!("simple_hook only runs on Windows");
}
