use super::*;
use pretty_assertions::assert_eq;

#[test]
fn buffer_handler_println_appends_newline() {
    let handler = BufferPrintHandler::new();
    handler.println("hello");
    assert_eq!(handler.get_output(), "hello\n");
}

#[test]
fn buffer_handler_mixes_print_and_println() {
    let handler = BufferPrintHandler::new();
    handler.print("hello");
    handler.print(" ");
    handler.println("world");
    handler.println("again");
    assert_eq!(handler.get_output(), "hello world\nagain\n");
    assert_eq!(handler.lines(), vec!["hello world", "again"]);
}

#[test]
fn buffer_handler_clear_empties_buffer() {
    let handler = buffer_handler();
    handler.println("hello");
    handler.clear();
    assert!(handler.get_output().is_empty());
}

#[test]
fn silent_handler_discards_output() {
    let handler = silent_handler();
    handler.println("hello");
    handler.print("world");
    assert_eq!(handler.get_output(), "");
    assert!(handler.lines().is_empty());
}

#[test]
fn buffer_handler_is_shared_across_threads() {
    let handler = buffer_handler();
    let workers: Vec<_> = (0..4)
        .map(|n| {
            let handler = Arc::clone(&handler);
            std::thread::spawn(move || handler.println(&format!("line {n}")))
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    let mut lines = handler.lines();
    lines.sort();
    assert_eq!(lines, vec!["line 0", "line 1", "line 2", "line 3"]);
}
