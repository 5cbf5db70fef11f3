//! Ring buffer tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use rust_usart_cli::RingBuffer;

#[test]
fn test_fifo_order_across_wraparound() {
    let mut ring = RingBuffer::<8>::new();
    let (mut tx, mut rx) = ring.split();
    let mut next_in = 0u8;
    let mut next_out = 0u8;

    for _ in 0..20 {
        for _ in 0..5 {
            assert!(tx.slots_available() > 0);
            tx.write(next_in);
            next_in = next_in.wrapping_add(1);
        }
        assert_eq!(rx.bytes_available(), 5);
        assert!(!tx.is_full());

        while rx.is_not_empty() {
            assert_eq!(rx.read(), next_out);
            next_out = next_out.wrapping_add(1);
        }
        assert!(rx.is_empty());
    }

    assert_eq!(next_in, next_out);
}

#[test]
fn test_occupancy_flags_agree() {
    let mut ring = RingBuffer::<4>::new();
    assert_eq!(ring.capacity(), 4);

    let (mut tx, mut rx) = ring.split();
    for n in 0..4u32 {
        assert_eq!(rx.bytes_available(), n);
        assert_eq!(tx.slots_available(), 4 - n);
        assert!(!tx.is_full());
        tx.write(n as u8);
        assert!(rx.is_not_empty());
    }
    assert!(tx.is_full());

    rx.read();
    assert!(!tx.is_full());
    assert_eq!(tx.slots_available(), 1);
}

#[test]
fn test_write_when_full_corrupts_oldest() {
    let mut ring = RingBuffer::<4>::new();
    let (mut tx, mut rx) = ring.split();

    for b in 1..=4 {
        tx.write(b);
    }

    // Precondition every caller must check
    assert_eq!(tx.slots_available(), 0);

    // Ignoring it overwrites the oldest unread byte
    tx.write(5);
    assert_eq!(rx.read(), 5);
}

#[test]
fn test_spsc_in_order_under_contention() {
    const TOTAL: usize = 100_000;

    let mut ring = RingBuffer::<32>::new();
    let (mut tx, mut rx) = ring.split();

    thread::scope(|s| {
        s.spawn(move || {
            for i in 0..TOTAL {
                while tx.slots_available() == 0 {
                    thread::yield_now();
                }
                tx.write(i as u8);
            }
        });

        s.spawn(move || {
            let mut received = 0usize;
            while received < TOTAL {
                if rx.is_not_empty() {
                    assert_eq!(rx.read(), received as u8);
                    received += 1;
                } else {
                    thread::yield_now();
                }
            }
            assert!(rx.is_empty());
        });
    });
}

#[test]
fn test_spsc_read_never_exceeds_written() {
    let mut ring = RingBuffer::<16>::new();
    let (mut tx, mut rx) = ring.split();
    let done = AtomicBool::new(false);

    let (written, read) = thread::scope(|s| {
        let producer = s.spawn(|| {
            let mut written = 0u32;
            for i in 0..50_000u32 {
                // Best effort: drop when full
                if tx.slots_available() > 0 {
                    tx.write(i as u8);
                    written += 1;
                }
            }
            done.store(true, Ordering::Release);
            written
        });

        let consumer = s.spawn(|| {
            let mut read = 0u32;
            loop {
                let finished = done.load(Ordering::Acquire);
                while rx.is_not_empty() {
                    rx.read();
                    read += 1;
                }
                if finished {
                    break;
                }
                thread::yield_now();
            }
            read
        });

        (producer.join().unwrap(), consumer.join().unwrap())
    });

    assert!(written > 0);
    assert!(read <= written);
    assert_eq!(read, written);
}
