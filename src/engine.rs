//! The parallel read/write engine.
//!
//! ## Read pipeline
//!
//! 1. Read a chunk (main thread, the only place the stream is touched)
//! 2. Count the chunk's lines (worker pool)
//! 3. Parse the chunk (worker pool)
//!
//! The line count must complete before the parse can be scheduled, because the
//! chunk's starting line number decides
//!
//! 1. the row/column position of the first value in array files,
//! 2. the chunk's offset into pre-sized result containers, and
//! 3. the line numbers cited by error messages.
//!
//! Line-count tasks are cheap but still go to the pool; their completion cells are
//! kept in a FIFO so chunks are assigned line numbers in stream order no matter
//! which worker finishes first. Once the front cell completes, the producer
//! dispatches the parse task for that chunk and reads one more chunk to replace
//! it. Parse tasks are fire-and-forget; the scope join at the end is the barrier.
//!
//! As backpressure the producer keeps at most `10 * num_threads` tasks in flight.
//! Too few would starve workers on uneven chunk splits; too many would pile up
//! chunk buffers in memory. When the cap is reached and the front cell is not
//! ready, the producer yields the CPU.
//!
//! ## Write pipeline
//!
//! The mirror image: the producer repeatedly carves a cheap work unit off the
//! formatter, ships its render to the pool, and holds completed text in a FIFO of
//! slots keyed by submission order. Slots are flushed to the output stream as the
//! completed prefix becomes contiguous, so output bytes appear in formatter order
//! regardless of worker completion order.
//!
//! ## Errors and cancellation
//!
//! The first error signalled by any worker flips an abort flag. The producer then
//! stops issuing tasks, the scope drains outstanding work (workers check the flag
//! and skip), and the captured error is surfaced. Caller containers may be left
//! partially populated but always valid.
//!
//! ## Sequential fallback
//!
//! With `num_threads == 1`, `parallel_ok == false`, a handler that rejects
//! parallelism, or the `parallel` feature disabled, the same pipeline runs inline
//! with identical observable behavior.

#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
use std::collections::VecDeque;
use std::io::{BufRead, Write};
#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
use std::sync::{Arc, Mutex};

use crate::chunk::{count_lines, get_next_chunk};
use crate::error::{ParmatError, Result};
use crate::format::{FormatChunk, Formatter};
use crate::handler::{ChunkHandler, Handler};
use crate::header::{Format, Header, Object, Symmetry};
use crate::options::{ReadOptions, WriteOptions};
use crate::parse::{
    array_start_position, expected_records, read_chunk_array, read_chunk_matrix_coordinate,
    read_chunk_vector_coordinate,
};
use crate::symmetry::GeneralizingHandler;

/// Reads the body of a file whose header has already been consumed, feeding
/// `handler` one record at a time.
///
/// When `options.generalize_symmetry` is set and the header declares a
/// non-`general` symmetry, the handler is transparently wrapped in a
/// [`GeneralizingHandler`]. The declared record count is enforced: a body with
/// fewer records fails with `FileTooShort`, more with `FileTooLong`.
///
/// Returns the total number of lines consumed from the file, header included.
pub fn read_body<R, H>(
    stream: &mut R,
    header: &Header,
    handler: &H,
    options: &ReadOptions,
) -> Result<u64>
where
    R: BufRead + Send,
    H: Handler,
{
    header.validate()?;
    if options.generalize_symmetry
        && header.symmetry != Symmetry::General
        && header.object == Object::Matrix
    {
        let generalizing = GeneralizingHandler::new(handler, header.symmetry);
        read_body_inner(stream, header, &generalizing, options)
    } else {
        read_body_inner(stream, header, handler, options)
    }
}

fn read_body_inner<R, H>(
    stream: &mut R,
    header: &Header,
    handler: &H,
    options: &ReadOptions,
) -> Result<u64>
where
    R: BufRead + Send,
    H: Handler,
{
    let requested = resolve_threads(options.num_threads, options.parallel_ok && H::PARALLEL_OK);

    #[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
    let (lines, records) = if requested != 1 {
        read_body_parallel(stream, header, handler, options, requested)?
    } else {
        read_body_sequential(stream, header, handler, options)?
    };

    #[cfg(any(not(feature = "parallel"), target_arch = "wasm32"))]
    let (lines, records) = {
        let _ = requested;
        read_body_sequential(stream, header, handler, options)?
    };

    let expected = expected_records(header);
    if records < expected {
        return Err(ParmatError::FileTooShort {
            expected,
            found: records,
        });
    }
    if records > expected {
        return Err(ParmatError::FileTooLong {
            expected,
            found: records,
        });
    }
    Ok(lines)
}

/// Writes a body by draining `formatter`, preserving its chunk order in the
/// output no matter how many workers render concurrently.
pub fn write_body<W, F>(out: &mut W, formatter: F, options: &WriteOptions) -> Result<()>
where
    W: Write + Send,
    F: Formatter,
{
    let requested = resolve_threads(options.num_threads, true);

    #[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
    {
        if requested != 1 {
            return write_body_parallel(out, formatter, options, requested);
        }
    }
    #[cfg(any(not(feature = "parallel"), target_arch = "wasm32"))]
    let _ = requested;

    write_body_sequential(out, formatter, options)
}

// 1 forces the inline pipeline; 0 asks the pool for one worker per core.
fn resolve_threads(requested: usize, parallel_ok: bool) -> usize {
    #[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
    {
        if parallel_ok {
            requested
        } else {
            1
        }
    }
    #[cfg(any(not(feature = "parallel"), target_arch = "wasm32"))]
    {
        let _ = (requested, parallel_ok);
        1
    }
}

fn parse_chunk<C: ChunkHandler>(
    chunk: &[u8],
    header: &Header,
    chunk_line_start: u64,
    body_offset: u64,
    sink: &mut C,
    options: &ReadOptions,
) -> Result<u64> {
    match (header.format, header.object) {
        (Format::Array, _) => {
            let (row0, col0) = array_start_position(header, body_offset);
            read_chunk_array(chunk, header, chunk_line_start, sink, row0, col0)
        }
        (Format::Coordinate, Object::Matrix) => {
            read_chunk_matrix_coordinate(chunk, header, chunk_line_start, sink, options)
        }
        (Format::Coordinate, Object::Vector) => {
            read_chunk_vector_coordinate(chunk, header, chunk_line_start, sink)
        }
    }
}

fn read_body_sequential<R, H>(
    stream: &mut R,
    header: &Header,
    handler: &H,
    options: &ReadOptions,
) -> Result<(u64, u64)>
where
    R: BufRead,
    H: Handler,
{
    let mut line_num = header.header_line_count;
    let mut records = 0u64;
    while let Some(chunk) = get_next_chunk(stream, options)? {
        let chunk_line_start = line_num + 1;
        let body_offset = line_num - header.header_line_count;
        let mut sink = handler.chunk_handler(body_offset);
        records += parse_chunk(
            &chunk,
            header,
            chunk_line_start,
            body_offset,
            &mut sink,
            options,
        )?;
        line_num += count_lines(&chunk);
    }
    Ok((line_num, records))
}

fn write_body_sequential<W, F>(out: &mut W, mut formatter: F, options: &WriteOptions) -> Result<()>
where
    W: Write,
    F: Formatter,
{
    while formatter.has_next() {
        let chunk = formatter.next_chunk(options);
        out.write_all(chunk.render().as_bytes())?;
    }
    Ok(())
}

/// Shared state of one pipeline run: the abort flag, the first captured error,
/// and the in-flight task accounting that implements backpressure.
#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
#[derive(Default)]
struct PipelineContext {
    abort: AtomicBool,
    first_error: Mutex<Option<ParmatError>>,
    in_flight: AtomicUsize,
    records: AtomicU64,
}

#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
impl PipelineContext {
    fn signal(&self, err: ParmatError) {
        let mut guard = self.first_error.lock().unwrap_or_else(|p| p.into_inner());
        if guard.is_none() {
            *guard = Some(err);
            self.abort.store(true, Ordering::SeqCst);
        }
    }

    fn aborted(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }

    fn take_error(&self) -> Option<ParmatError> {
        self.first_error
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take()
    }

    fn task_started(&self) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
    }

    fn task_finished(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn tasks_in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    fn add_records(&self, n: u64) {
        self.records.fetch_add(n, Ordering::Relaxed);
    }

    fn records(&self) -> u64 {
        self.records.load(Ordering::SeqCst)
    }
}

/// A pending line count: the chunk travels to the pool inside the cell and is
/// taken back by the producer once `done` flips.
#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
struct CountCell {
    chunk: Mutex<Option<Vec<u8>>>,
    lines: AtomicU64,
    done: AtomicBool,
}

#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
impl CountCell {
    fn new(chunk: Vec<u8>) -> Self {
        Self {
            chunk: Mutex::new(Some(chunk)),
            lines: AtomicU64::new(0),
            done: AtomicBool::new(false),
        }
    }

    fn run(&self) {
        let guard = self.chunk.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(chunk) = guard.as_ref() {
            self.lines.store(count_lines(chunk), Ordering::Relaxed);
        }
        drop(guard);
        self.done.store(true, Ordering::Release);
    }

    fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    fn take(&self) -> (Vec<u8>, u64) {
        let chunk = self
            .chunk
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take()
            .unwrap_or_default();
        (chunk, self.lines.load(Ordering::Acquire))
    }
}

#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
fn read_body_parallel<R, H>(
    stream: &mut R,
    header: &Header,
    handler: &H,
    options: &ReadOptions,
    requested: usize,
) -> Result<(u64, u64)>
where
    R: BufRead + Send,
    H: Handler,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(requested)
        .build()
        .map_err(|e| ParmatError::InvalidArgument(format!("cannot build thread pool: {e}")))?;
    // The producer occupies one pool thread while it spins on the front cell;
    // a pool without a second thread would starve the spawned tasks.
    if pool.current_num_threads() < 2 {
        return read_body_sequential(stream, header, handler, options);
    }
    let cap = 10 * pool.current_num_threads();
    let ctx = PipelineContext::default();

    let line_num = pool.scope(|s| {
        let ctx = &ctx;
        let mut pending: VecDeque<Arc<CountCell>> = VecDeque::new();
        let mut line_num = header.header_line_count;
        let mut eof = false;

        // Seed the pipeline with chunks and their line-count tasks.
        while pending.len() < cap && !eof && !ctx.aborted() {
            match get_next_chunk(stream, options) {
                Ok(Some(chunk)) => {
                    let cell = Arc::new(CountCell::new(chunk));
                    pending.push_back(Arc::clone(&cell));
                    ctx.task_started();
                    s.spawn(move |_| {
                        cell.run();
                        ctx.task_finished();
                    });
                }
                Ok(None) => eof = true,
                Err(e) => {
                    ctx.signal(e);
                    eof = true;
                }
            }
        }

        // Consume cells in stream order as their line counts become available.
        while let Some(front) = pending.front() {
            if ctx.aborted() {
                break;
            }
            if !front.is_done() || ctx.tasks_in_flight() >= cap {
                std::thread::yield_now();
                continue;
            }
            let cell = match pending.pop_front() {
                Some(cell) => cell,
                None => break,
            };

            // Replace the consumed chunk to keep the pipeline full.
            if !eof {
                match get_next_chunk(stream, options) {
                    Ok(Some(chunk)) => {
                        let next = Arc::new(CountCell::new(chunk));
                        pending.push_back(Arc::clone(&next));
                        ctx.task_started();
                        s.spawn(move |_| {
                            next.run();
                            ctx.task_finished();
                        });
                    }
                    Ok(None) => eof = true,
                    Err(e) => {
                        ctx.signal(e);
                        eof = true;
                    }
                }
            }

            let (chunk, lines) = cell.take();
            let chunk_line_start = line_num + 1;
            let body_offset = line_num - header.header_line_count;
            line_num += lines;

            let mut sink = handler.chunk_handler(body_offset);
            ctx.task_started();
            s.spawn(move |_| {
                if !ctx.aborted() {
                    match parse_chunk(
                        &chunk,
                        header,
                        chunk_line_start,
                        body_offset,
                        &mut sink,
                        options,
                    ) {
                        Ok(n) => ctx.add_records(n),
                        Err(e) => ctx.signal(e),
                    }
                }
                // Dropping the sink flushes buffering chunk handlers.
                drop(sink);
                ctx.task_finished();
            });
        }
        line_num
    });

    if let Some(err) = ctx.take_error() {
        return Err(err);
    }
    Ok((line_num, ctx.records()))
}

/// A submitted write work unit: the chunk travels to the pool inside the slot,
/// the rendered text travels back.
#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
struct RenderSlot<C> {
    input: Mutex<Option<C>>,
    text: Mutex<Option<String>>,
    done: AtomicBool,
}

#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
impl<C: FormatChunk> RenderSlot<C> {
    fn new(chunk: C) -> Self {
        Self {
            input: Mutex::new(Some(chunk)),
            text: Mutex::new(None),
            done: AtomicBool::new(false),
        }
    }

    fn render(&self) {
        let chunk = self.input.lock().unwrap_or_else(|p| p.into_inner()).take();
        if let Some(chunk) = chunk {
            let text = chunk.render();
            *self.text.lock().unwrap_or_else(|p| p.into_inner()) = Some(text);
        }
        self.done.store(true, Ordering::Release);
    }

    fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    fn take_text(&self) -> String {
        self.text
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take()
            .unwrap_or_default()
    }
}

#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
fn write_body_parallel<W, F>(
    out: &mut W,
    mut formatter: F,
    options: &WriteOptions,
    requested: usize,
) -> Result<()>
where
    W: Write + Send,
    F: Formatter,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(requested)
        .build()
        .map_err(|e| ParmatError::InvalidArgument(format!("cannot build thread pool: {e}")))?;
    if pool.current_num_threads() < 2 {
        return write_body_sequential(out, formatter, options);
    }
    let cap = 10 * pool.current_num_threads();
    let abort = AtomicBool::new(false);

    let io_result = pool.scope(|s| {
        let abort = &abort;
        let mut pending: VecDeque<Arc<RenderSlot<F::Chunk>>> = VecDeque::new();

        loop {
            // Flush the contiguous completed prefix in submission order.
            while pending.front().is_some_and(|slot| slot.is_done()) {
                let slot = match pending.pop_front() {
                    Some(slot) => slot,
                    None => break,
                };
                if let Err(e) = out.write_all(slot.take_text().as_bytes()) {
                    abort.store(true, Ordering::SeqCst);
                    return Err(ParmatError::from(e));
                }
            }

            if formatter.has_next() && pending.len() < cap {
                let slot = Arc::new(RenderSlot::new(formatter.next_chunk(options)));
                pending.push_back(Arc::clone(&slot));
                s.spawn(move |_| {
                    if !abort.load(Ordering::Relaxed) {
                        slot.render();
                    } else {
                        slot.done.store(true, Ordering::Release);
                    }
                });
            } else if pending.is_empty() && !formatter.has_next() {
                return Ok(());
            } else {
                std::thread::yield_now();
            }
        }
    });

    io_result
}
