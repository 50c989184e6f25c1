//! Error handling.

use std::io::Write;

error_chain!{}

/// Prints the given error to the given stream.
///
/// # Panics
///
/// Panics if the error cannot be written into the stream.
pub fn print_error(err: &Error, stream: &mut Write) {
    let write_err_msg = "error writing to the given stream";

    writeln!(stream, "error: {}", err).expect(write_err_msg);

    for cause in err.iter().skip(1) {
        writeln!(stream, "  caused by: {}", cause).expect(write_err_msg);
    }

    // Run the program with `RUST_BACKTRACE=1` to show the backtrace.
    if let Some(backtrace) = err.backtrace() {
        writeln!(stream, "{:?}", backtrace).expect(write_err_msg);
    }
}
