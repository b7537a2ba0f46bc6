use ferry_runtime::{DeferredCall, ScriptedInterpreter, Shell, ShellConfig};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[test]
fn producer_thread_submissions_arrive_in_order_exactly_once() {
    const CALLS: u32 = 100;

    let log: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();

    let interp = ScriptedInterpreter::new(0).step(move |ctx| {
        let mut executed = 0;
        while executed < CALLS as usize {
            ctx.wait_for_deferred(Duration::from_secs(5));
            executed += ctx.process_deferred().unwrap();
        }
    });

    let mut shell = Shell::with_config(
        Box::new(interp),
        None,
        ShellConfig::default().without_diagnostics(),
    );

    let handle = shell.handle();
    let producer = thread::spawn(move || {
        for value in 0..CALLS {
            let sink = sink.clone();
            handle.submit(DeferredCall::free(move || {
                sink.lock().unwrap().push(value);
            }));
        }
    });

    assert_eq!(shell.start(), 0);
    producer.join().unwrap();

    assert_eq!(*log.lock().unwrap(), (0..CALLS).collect::<Vec<_>>());
}

#[test]
fn stale_bound_call_is_skipped_end_to_end() {
    let live_ran: Arc<Mutex<bool>> = Arc::new(Mutex::new(false));
    let flag = live_ran.clone();

    let interp = ScriptedInterpreter::new(0).step(move |ctx| {
        let stale_id = {
            let guard = ctx.targets().register();
            guard.id()
        };
        let live_guard = ctx.targets().register();

        ctx.loop_handle().submit(DeferredCall::bound(stale_id, || {
            panic!("stale receiver must not run");
        }));
        let flag = flag.clone();
        ctx.loop_handle()
            .submit(DeferredCall::bound(live_guard.id(), move || {
                *flag.lock().unwrap() = true;
            }));

        // Both calls are delivered; only the live one executes a body.
        assert_eq!(ctx.process_deferred().unwrap(), 2);
    });

    let mut shell = Shell::with_config(
        Box::new(interp),
        None,
        ShellConfig::default().without_diagnostics(),
    );
    assert_eq!(shell.start(), 0);
    assert!(*live_ran.lock().unwrap());
}
