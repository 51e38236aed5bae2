use criterion::{Criterion, black_box, criterion_group, criterion_main};
use dsk_engine::{SampleKind, SampleRate, Session};

fn bench_render_tick(c: &mut Criterion) {
    let session = Session::new(SampleRate::Sr48000, SampleKind::S16).unwrap();
    for id in 1..=4 {
        session.add_track(id).unwrap();
        session.choose_input_channel(id, 0).unwrap();
    }

    let mut feed = session.open_capture(1, 64);
    let mut renderer = session.renderer(2);
    let input: Vec<u8> = (0..64i16).flat_map(|v| (v * 100).to_le_bytes()).collect();
    let mut out = vec![0u8; 64 * 2 * 2];

    c.bench_function("render_tick_4_tracks_s16", |b| {
        b.iter(|| {
            feed.write_interleaved(black_box(&input));
            renderer.render(black_box(&mut out), 0);
        })
    });
}

fn bench_codec_sum(c: &mut Criterion) {
    use dsk_engine::{FormatInfo, codec};

    let fmt = FormatInfo::of(SampleKind::S24);
    let src = vec![0x40u8; 1024 * fmt.bytes_in_wire];
    let mut dst = vec![0u8; 1024 * fmt.bytes_in_wire];

    c.bench_function("add_and_scale_1024_s24", |b| {
        b.iter(|| {
            codec::add_and_scale(black_box(&src), black_box(&mut dst), &fmt, 0.8, 1024);
        })
    });
}

criterion_group!(benches, bench_render_tick, bench_codec_sum);
criterion_main!(benches);
