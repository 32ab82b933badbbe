//! Integration tests for the remote-build pipeline.

use std::time::{Duration, Instant};

use remote_build::{ConsoleCommand, RemoteBuild};
use remote_build_core::{Error, FoldRegion, RemoteBuildConfig, TokenKind};
use remote_build_session::TransportCommand;
use remote_build_view::{BufferSink, DisplaySink, RenderLoop};
use tokio::runtime::Runtime;

fn scope(render: &RenderLoop<BufferSink>) -> Option<String> {
    render.sink().scope_at_selection()
}

fn pipeline(runtime: &Runtime, config: RemoteBuildConfig) -> (RemoteBuild, RenderLoop<BufferSink>) {
    let settings = config.view.clone();
    let (app, receiver) = RemoteBuild::new(config, runtime.handle().clone()).unwrap();
    let render = RenderLoop::new(receiver, BufferSink::new(), &settings).unwrap();
    (app, render)
}

/// Render until `done` holds or five seconds pass.
fn render_until(render: &mut RenderLoop<BufferSink>, done: impl Fn(&BufferSink) -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        render.render();
        if done(render.sink()) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    false
}

#[test]
fn test_fragments_fold_around_matching_line() {
    let runtime = Runtime::new().unwrap();
    let mut config = RemoteBuildConfig::default();
    config.view.filter = "match".to_string();
    let (app, mut render) = pipeline(&runtime, config);

    for fragment in ["A\n", "B match\n", "C\n", "D\n"] {
        app.coalescer().feed(fragment);
    }
    assert!(render_until(&mut render, |sink| sink.row_count() == 4));

    assert_eq!(
        render.sink().folds(),
        &[FoldRegion::row(0), FoldRegion::new(2, 4)]
    );
    assert_eq!(render.sink().visible_lines(), vec!["B match"]);
}

#[test]
fn test_invalid_filter_leaves_view_untouched() {
    let runtime = Runtime::new().unwrap();
    let (mut app, mut render) = pipeline(&runtime, RemoteBuildConfig::default());

    app.set_filter("error").unwrap();
    app.coalescer().feed("error: one\nok\n");
    app.coalescer().flush();
    render.render();
    let folds = render.sink().folds().to_vec();

    let err = app.set_filter("(unbalanced").unwrap_err();
    assert!(matches!(err, Error::FilterCompile { .. }));
    assert!(err.to_string().starts_with("invalid regex"));
    assert_eq!(app.filter_pattern(), "error");

    render.render();
    assert_eq!(render.filter().pattern(), "error");
    assert_eq!(render.sink().lines(), vec!["error: one", "ok"]);
    assert_eq!(render.sink().folds(), folds.as_slice());
}

#[test]
fn test_eleven_lines_flush_at_once() {
    let runtime = Runtime::new().unwrap();
    let (app, mut render) = pipeline(&runtime, RemoteBuildConfig::default());

    let fragment: String = (1..=11).map(|i| format!("line {i}\n")).collect();
    app.coalescer().feed(&fragment);

    // No debounce wait needed
    assert_eq!(render.render(), 1);
    let expected: Vec<String> = (1..=11).map(|i| format!("line {i}")).collect();
    assert_eq!(render.sink().lines(), expected);
}

#[test]
fn test_max_lines_keeps_newest() {
    let runtime = Runtime::new().unwrap();
    let mut config = RemoteBuildConfig::default();
    config.view.max_lines = 3;
    let (app, mut render) = pipeline(&runtime, config);

    for line in ["one", "two", "three", "four", "five"] {
        app.coalescer().feed(&format!("{line}\n"));
    }
    assert!(render_until(&mut render, |sink| sink.line(2) == Some("five")));
    assert_eq!(render.sink().lines(), vec!["three", "four", "five"]);
    assert_eq!(render.document().len(), 3);
}

#[test]
fn test_console_token_filter() {
    let runtime = Runtime::new().unwrap();
    let (mut app, mut render) = pipeline(&runtime, RemoteBuildConfig::default());

    let lines = [
        "01-02 03:04:05.678 I/ActivityManager( 123): Start proc",
        "01-02 03:04:05.700 D/dalvikvm(  456): GC freed",
        "01-02 03:04:05.800 W/ActivityManager( 123): Slow",
    ];
    app.coalescer().feed(&format!("{}\n", lines.join("\n")));
    app.coalescer().flush();

    let command = ConsoleCommand::parse(&format!(":pid {}", lines[0])).unwrap();
    assert!(command.execute(&mut app, scope(&render).as_deref()).unwrap());
    render.render();
    assert_eq!(render.sink().visible_lines(), vec![lines[0], lines[2]]);

    let command = ConsoleCommand::parse(":name make: *** [all] Error 2").unwrap();
    let err = command
        .execute(&mut app, scope(&render).as_deref())
        .unwrap_err();
    assert!(matches!(err, Error::Extraction(TokenKind::ProcessName)));
    assert_eq!(err.to_string(), "Couldn't extract process name");
}

#[cfg(unix)]
#[test]
fn test_document_holds_only_remote_output() {
    let runtime = Runtime::new().unwrap();
    let mut config = RemoteBuildConfig::default();
    config.remote.build_command = "printf 'only-output\\n'".to_string();

    let settings = config.view.clone();
    let (app, receiver) = RemoteBuild::new(config, runtime.handle().clone()).unwrap();
    let shell = TransportCommand::new("/bin/sh")
        .arg("-c")
        .arg("while IFS= read -r cmd; do eval \"$cmd\"; done");
    let mut app = app.with_transport(shell);
    let mut render = RenderLoop::new(receiver, BufferSink::new(), &settings).unwrap();

    app.launch().unwrap();
    assert!(render_until(&mut render, |sink| sink.row_count() > 0));

    // Give any echo a chance to arrive
    std::thread::sleep(Duration::from_millis(300));
    render.render();
    assert_eq!(render.document().iter().collect::<Vec<_>>(), vec!["only-output"]);
    app.close();
}

#[cfg(unix)]
#[test]
fn test_shell_session_end_to_end() {
    let runtime = Runtime::new().unwrap();
    let mut config = RemoteBuildConfig::default();
    config.remote.directory = "/".to_string();
    config.remote.setup_command = "echo setup-done".to_string();
    config.remote.build_command = "echo build-done".to_string();

    let settings = config.view.clone();
    let (app, receiver) = RemoteBuild::new(config, runtime.handle().clone()).unwrap();
    let mut app = app.with_transport(TransportCommand::new("/bin/sh"));
    let mut render = RenderLoop::new(receiver, BufferSink::new(), &settings).unwrap();

    let build_output = |sink: &BufferSink| {
        sink.lines()
            .iter()
            .any(|line| line.ends_with("build-done") && !line.contains("echo"))
    };

    let id = app.launch().unwrap();
    assert_eq!(app.session_id(), Some(id));
    assert!(render_until(&mut render, build_output), "got {:?}", render.sink().lines());

    // Clearing runs the build again into an empty view
    app.clear_view().unwrap();
    assert!(render_until(&mut render, |sink| {
        build_output(sink) && !sink.lines().iter().any(|line| line.ends_with("setup-done"))
    }));

    // Relaunch replaces the session
    let relaunched = app.launch().unwrap();
    assert_ne!(relaunched, id);

    app.close();
    assert!(!app.is_open());
    assert!(app.session_status().is_none());
}
