use std::collections::HashMap;

use criterion::{
    black_box, criterion_group, criterion_main, AxisScale, BenchmarkId, Criterion,
    PlotConfiguration, Throughput,
};
use ndlayout::{
    chunker::{Chunker, Merge},
    fill_value::FillValue,
    index_space::IndexSpace,
    tiled::TiledData,
    tiling::Tiling,
    ArrayIndices,
};

fn chunker_transfer(c: &mut Criterion) {
    let plot_config = PlotConfiguration::default().summary_scale(AxisScale::Logarithmic);
    let mut group = c.benchmark_group("chunker_transfer");
    group.plot_config(plot_config);

    for size in [16u64, 64, 256] {
        let data_chunk = IndexSpace::new_with_shape(vec![size; 3]);
        let want_space = IndexSpace::new_with_ranges(&[
            1..=size as i64 - 2,
            1..=size as i64 - 2,
            0..=size as i64 - 1,
        ]);
        let src = vec![0u8; (size * size * size) as usize];
        let mut dst = vec![0u8; want_space.num_elements_usize()];
        group.throughput(Throughput::Bytes(want_space.num_elements()));
        for merge in [Merge::All, Merge::NotFirst, Merge::None] {
            group.bench_function(BenchmarkId::new(merge.to_string(), size), |b| {
                b.iter(|| {
                    let chunker = Chunker::new(&data_chunk, 1, &want_space, merge).unwrap();
                    chunker.transfer(&src, &mut dst).unwrap();
                });
            });
        }
    }
}

fn chunker_iterate(c: &mut Criterion) {
    let plot_config = PlotConfiguration::default().summary_scale(AxisScale::Logarithmic);
    let mut group = c.benchmark_group("chunker_iterate");
    group.plot_config(plot_config);

    for size in [16u64, 64, 256] {
        let data_chunk = IndexSpace::new_with_shape(vec![size; 3]);
        let want_space = IndexSpace::new_with_ranges(&vec![0..=size as i64 - 1; 3]);
        group.throughput(Throughput::Elements(want_space.num_elements()));
        group.bench_function(BenchmarkId::new("none", size), |b| {
            b.iter(|| {
                Chunker::new(&data_chunk, 4, &want_space, Merge::None)
                    .unwrap()
                    .for_each(|chunk| {
                        black_box(chunk.nelems);
                    });
            });
        });
    }
}

fn tiled_read(c: &mut Criterion) {
    let plot_config = PlotConfiguration::default().summary_scale(AxisScale::Logarithmic);
    let mut group = c.benchmark_group("tiled_read");
    group.plot_config(plot_config);

    let chunk_shape = vec![32u64; 3];
    for size in [64u64, 128, 256] {
        let tiling = Tiling::new(vec![size; 3], &chunk_shape).unwrap();
        let chunk_bytes = vec![1u8; 32 * 32 * 32 * 2];
        let chunks: HashMap<ArrayIndices, Vec<u8>> = tiling
            .tiles(&IndexSpace::new_with_shape(vec![size; 3]))
            .unwrap()
            .iter()
            .map(|(_tile, origin)| (origin, chunk_bytes.clone()))
            .collect();
        let tiled = TiledData::new(tiling, 2, FillValue::from(0u16)).unwrap();
        let want_space = IndexSpace::new_with_ranges(&[
            3..=size as i64 - 4,
            5..=size as i64 - 6,
            7..=size as i64 - 8,
        ]);
        group.throughput(Throughput::Bytes(want_space.num_elements() * 2));
        group.bench_function(BenchmarkId::new("read", size), |b| {
            b.iter(|| black_box(tiled.read(&chunks, &want_space).unwrap()));
        });
    }
}

criterion_group!(benches, chunker_transfer, chunker_iterate, tiled_read);
criterion_main!(benches);
