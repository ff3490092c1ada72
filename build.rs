use std::mem;
use std::ptr;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
struct Inner {
    a: u16,
    b: u16,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
struct Outer {
    inner: Inner,
    c: u32,
    d: [u8; 4],
}

fn layout_broken(what: &str) {
    panic!(
        concat!(
            "Assumptions on layout are broken, this crate relies on ",
            "`#[repr(C)]` keeping declaration order, ",
            "now layout of {:?} is broken, report about it on github"
        ),
        what
    );
}

/// Tests some layout assumptions, these cases as of now:
///
/// 1. `#[repr(C)]` fields sit in declaration order with no gap between
///    fields whose sizes already line up
/// 2. a value written at an unaligned byte offset reads back unchanged
fn test_layouts() {
    // Test declaration order
    {
        let offsets = [
            mem::offset_of!(Outer, inner),
            mem::offset_of!(Outer, c),
            mem::offset_of!(Outer, d),
        ];
        if offsets != [0, 4, 8] || mem::size_of::<Outer>() != 12 {
            layout_broken("repr(C) records");
        }
        if mem::offset_of!(Inner, b) != 2 {
            layout_broken("nested repr(C) records");
        }
    }

    // Test unaligned copies
    {
        let value = Outer {
            inner: Inner { a: 1, b: 2 },
            c: 0xdead_beef,
            d: [3, 4, 5, 6],
        };
        let mut buf = [0u8; 1 + mem::size_of::<Outer>()];

        let copy = unsafe {
            ptr::write_unaligned(buf.as_mut_ptr().add(1).cast::<Outer>(), value);
            ptr::read_unaligned(buf.as_ptr().add(1).cast::<Outer>())
        };

        if copy != value || buf[0] != 0 {
            layout_broken("unaligned slots");
        }
    }
}

fn main() {
    // NOTE: this checks the host, not the target, and does not cover every
    // possible case; the registry re-checks each variant layout at run time.
    test_layouts();
    println!("cargo:rerun-if-changed=build.rs");
}
