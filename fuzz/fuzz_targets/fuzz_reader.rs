#![no_main]

use docsearch::output::{pretty_print, PrettyPrintOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Corrupt search data must produce an error, never a panic or a hang
    let options = PrettyPrintOptions {
        show_merged: true,
        show_lookahead_barriers: true,
        colors: false,
    };
    let _ = pretty_print(data, &options);
    let _ = docsearch::index::writer::base85_decode_search_data(&String::from_utf8_lossy(data));
});
