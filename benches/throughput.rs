use criterion::{Criterion, criterion_group, criterion_main};
use flate2::Compression;
use flate2::write::GzEncoder;
use readerz::open;
use std::io::{Cursor, Read, Write};

fn bench_read(c: &mut Criterion) {
    let mut data = Vec::new();
    for i in 0..20_000 {
        data.extend_from_slice(format!("record {i}\tACGTACGTACGTACGT\n").as_bytes());
    }
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(&data).unwrap();
    let compressed = enc.finish().unwrap();

    c.bench_function("read_plain_20000_lines", |b| {
        b.iter(|| {
            let mut rdr = open(Cursor::new(&data[..])).unwrap();
            let mut out = Vec::with_capacity(data.len());
            rdr.read_to_end(&mut out).unwrap();
            out.len()
        })
    });
    c.bench_function("read_gzip_20000_lines", |b| {
        b.iter(|| {
            let mut rdr = open(Cursor::new(&compressed[..])).unwrap();
            let mut out = Vec::with_capacity(data.len());
            rdr.read_to_end(&mut out).unwrap();
            out.len()
        })
    });
}

criterion_group!(benches, bench_read);
criterion_main!(benches);
