//! Formatting of stored observations for notification bodies

/// Mojo per XCH
const MOJO_PER_XCH: u128 = 1_000_000_000_000;

/// Binary-prefix units for byte quantities
const BYTE_UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

pub fn format_plot_count(plot_count: usize) -> String {
    format!("Plot count: {}", plot_count)
}

pub fn format_balance(mojo: u128) -> String {
    let xch = mojo as f64 / MOJO_PER_XCH as f64;
    format!("Total balance: {:.5} XCH", xch)
}

pub fn format_space(bytes: u128) -> String {
    let mut value = bytes as f64;
    let mut unit = BYTE_UNITS[0];
    for next in BYTE_UNITS[1..].iter().copied() {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("Network space: {:.3} {}", value, unit)
}

pub fn format_peak_height(height: u32) -> String {
    format!("Peak height: {}", height)
}

pub fn format_full_node_count(count: usize) -> String {
    format!("Full node peers: {}", count)
}

pub fn format_synced(synced: bool) -> String {
    format!("Synced: {}", if synced { "yes" } else { "no" })
}

pub fn format_proofs(proofs: u64) -> String {
    format!("Proofs found: {}", proofs)
}
