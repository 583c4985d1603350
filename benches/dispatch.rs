//! Dispatch throughput benchmark suite.
//!
//! Measures command round-trips through the writer/dispatcher tasks over
//! an in-memory loopback that echoes every command immediately. No
//! browser binary is involved; this isolates the runtime's own overhead.
//!
//! Run with: cargo bench --bench dispatch
//! Results saved to: target/criterion/

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use chrome_devtools::WireLog;
use chrome_devtools::transport::{Connection, pipe};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const BATCH_SIZES: &[usize] = &[10, 100];

// ============================================================================
// Loopback
// ============================================================================

/// Echoes an empty success response to every command.
async fn run_echo(io: DuplexStream) {
    let (read, mut write) = tokio::io::split(io);
    let mut lines = BufReader::new(read).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let request: Value = match serde_json::from_str(&line) {
            Ok(value) => value,
            Err(_) => continue,
        };
        let Some(id) = request["id"].as_u64() else {
            continue;
        };

        let mut frame = json!({"id": id, "result": {}}).to_string();
        frame.push('\n');
        if write.write_all(frame.as_bytes()).await.is_err() {
            break;
        }
    }
}

/// Builds a connection over the echo loopback.
fn echo_connection() -> Connection {
    let (client_io, echo_io) = tokio::io::duplex(1 << 20);
    tokio::spawn(run_echo(echo_io));

    let (client_read, client_write) = tokio::io::split(client_io);
    let (transport_tx, transport_rx) = pipe::pipe(client_write, client_read);
    Connection::spawn(transport_tx, transport_rx, WireLog::disabled())
}

// ============================================================================
// Benchmark: Single Round-Trip
// ============================================================================

fn bench_round_trip(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let connection = {
        let _guard = rt.enter();
        echo_connection()
    };
    let scope = CancellationToken::new();

    c.bench_function("round_trip", |b| {
        b.to_async(&rt).iter(|| {
            let connection = connection.clone();
            let scope = scope.clone();
            async move {
                connection
                    .execute("Echo.ping", None, None, &scope)
                    .await
                    .expect("echo")
            }
        });
    });
}

// ============================================================================
// Benchmark: Concurrent Commands
// ============================================================================

fn bench_concurrent_commands(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let connection = {
        let _guard = rt.enter();
        echo_connection()
    };
    let scope = CancellationToken::new();

    let mut group = c.benchmark_group("concurrent_commands");
    for &count in BATCH_SIZES {
        group.bench_with_input(BenchmarkId::new("batch", count), &count, |b, &count| {
            b.to_async(&rt).iter(|| {
                let connection = connection.clone();
                let scope = scope.clone();
                async move {
                    let calls: Vec<_> = (0..count)
                        .map(|_| {
                            let connection = connection.clone();
                            let scope = scope.clone();
                            tokio::spawn(async move {
                                connection.execute("Echo.ping", None, None, &scope).await
                            })
                        })
                        .collect();

                    for call in calls {
                        call.await.expect("join").expect("echo");
                    }
                }
            });
        });
    }
    group.finish();
}

// ============================================================================
// Criterion Setup
// ============================================================================

criterion_group!(benches, bench_round_trip, bench_concurrent_commands);
criterion_main!(benches);
