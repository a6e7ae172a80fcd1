//! Placeholder frames for samples that were counted but not recorded.
//!
//! Each lost-samples record carries a two-frame stack pointing into the
//! functions below, so a symbolizer renders the loss as a named frame.
//! The function bodies differ so the compiler cannot fold them into a
//! single address.

use std::hint::black_box;

use super::LossReason;

#[inline(never)]
pub fn lost_external_code() {
    black_box(1_u32);
}

#[inline(never)]
pub fn external_code() {
    black_box(2_u32);
}

#[inline(never)]
pub fn lost_while_busy() {
    black_box(3_u32);
}

#[inline(never)]
pub fn system() {
    black_box(4_u32);
}

// Points inside the function, like a return address would.
#[inline]
fn pc(f: fn()) -> usize {
    f as *const () as usize + 1
}

/// Stack of the record reporting stacks dropped by a full overflow buffer.
pub fn lost_external() -> [usize; 2] {
    [pc(lost_external_code), pc(external_code)]
}

/// Stack of the record reporting samples dropped while the writer was busy.
pub fn lost_busy() -> [usize; 2] {
    [pc(lost_while_busy), pc(system)]
}

/// Recognizes the stack of a lost-samples record.
pub fn loss_reason(stack: &[u64]) -> Option<LossReason> {
    let matches = |pcs: [usize; 2]| {
        stack.len() == 2 && stack[0] == pcs[0] as u64 && stack[1] == pcs[1] as u64
    };
    if matches(lost_external()) {
        Some(LossReason::ExternalCode)
    } else if matches(lost_busy()) {
        Some(LossReason::WriterBusy)
    } else {
        None
    }
}
