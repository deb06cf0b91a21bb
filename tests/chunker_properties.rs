use std::error::Error;

use ndlayout::{
    chunker::{Chunker, Merge, TransferChunk},
    index_space::IndexSpace,
};

/// Return the global indices of linearised `element` in `space`.
fn global_indices(space: &IndexSpace, mut element: u64) -> Vec<i64> {
    let mut indices = vec![0; space.rank()];
    for dim in (0..space.rank()).rev() {
        let size = space.shape()[dim];
        indices[dim] = space.start()[dim] + (element % size) as i64;
        element /= size;
    }
    indices
}

/// Pairs of (data chunk, wanted index space) with partial, full, boundary and empty overlaps.
fn cases() -> Vec<(IndexSpace, IndexSpace)> {
    let mut cases = vec![];
    let wants = [
        IndexSpace::new_with_shape(vec![3, 12]),
        IndexSpace::new_with_ranges(&[1..=4, 2..=9]),
        IndexSpace::new_with_ranges(&[5..=8, 20..=29, 5..=24]),
        IndexSpace::new_with_ranges(&[0..=0, 0..=5, 4..=7]),
        IndexSpace::new_with_ranges(&[2..=3, 0..=3, 1..=2, 0..=4]),
        IndexSpace::new_with_ranges(&[3..=10]),
    ];
    for want in wants {
        let rank = want.rank();
        for offset in [-3i64, -1, 0, 1, 2, 5] {
            for extent in [1u64, 2, 4, 7, 30] {
                let start: Vec<i64> = want
                    .start()
                    .iter()
                    .enumerate()
                    .map(|(dim, start)| start + offset * (dim as i64 % 2 * 2 - 1))
                    .collect();
                let shape = vec![extent; rank];
                cases.push((
                    IndexSpace::new_with_start_shape(start, shape).unwrap(),
                    want.clone(),
                ));
            }
        }
        cases.push((want.clone(), want));
    }
    cases
}

#[test]
fn chunker_coverage() -> Result<(), Box<dyn Error>> {
    for (data_chunk, want) in cases() {
        let intersect = data_chunk.intersect(&want)?;
        for merge in [Merge::All, Merge::NotFirst, Merge::None] {
            let mut covered = vec![];
            for chunk in Chunker::new(&data_chunk, 1, &want, merge)? {
                for i in 0..chunk.nelems {
                    let dst = global_indices(&want, chunk.dest_elem + i);
                    let src = global_indices(&data_chunk, chunk.src_elem + i);
                    assert_eq!(src, dst, "{data_chunk} {want} {merge}");
                    assert!(intersect.contains(&dst), "{data_chunk} {want} {merge}");
                    covered.push(dst);
                }
            }
            let expected: Vec<_> = intersect.indices().iter().collect();
            assert_eq!(covered, expected, "{data_chunk} {want} {merge}");
        }
    }
    Ok(())
}

#[test]
fn chunker_length_invariant() -> Result<(), Box<dyn Error>> {
    for (data_chunk, want) in cases() {
        let total = data_chunk.intersect(&want)?.num_elements();
        for merge in [Merge::All, Merge::NotFirst, Merge::None] {
            let chunker = Chunker::new(&data_chunk, 4, &want, merge)?;
            assert_eq!(chunker.total_nelems(), total);
            let nelems: u64 = chunker.map(|chunk| chunk.nelems).sum();
            assert_eq!(nelems, total, "{data_chunk} {want} {merge}");
        }
    }
    Ok(())
}

#[test]
fn chunker_monotonic() -> Result<(), Box<dyn Error>> {
    for (data_chunk, want) in cases() {
        for merge in [Merge::All, Merge::NotFirst, Merge::None] {
            let chunks: Vec<TransferChunk> = Chunker::new(&data_chunk, 4, &want, merge)?.collect();
            for pair in chunks.windows(2) {
                assert!(pair[0].dest_elem + pair[0].nelems <= pair[1].dest_elem);
                assert!(pair[0].src_elem + pair[0].nelems <= pair[1].src_elem);
            }
        }
    }
    Ok(())
}

#[test]
fn chunker_idempotent() -> Result<(), Box<dyn Error>> {
    for (data_chunk, want) in cases() {
        let chunks0: Vec<_> = Chunker::new(&data_chunk, 2, &want, Merge::All)?.collect();
        let chunks1: Vec<_> = Chunker::new(&data_chunk, 2, &want, Merge::All)?.collect();
        assert_eq!(chunks0, chunks1);
    }
    Ok(())
}

#[test]
fn chunker_merge_all_identical() -> Result<(), Box<dyn Error>> {
    for shape in [vec![3, 12], vec![2, 10, 20], vec![7], vec![1, 1, 5, 3]] {
        let space = IndexSpace::new_with_shape(shape);
        let chunks: Vec<_> = Chunker::new(&space, 8, &space, Merge::All)?.collect();
        assert_eq!(
            chunks,
            vec![TransferChunk::new(0, space.num_elements(), 0)]
        );

        let chunks: Vec<_> = Chunker::new(&space, 8, &space, Merge::None)?.collect();
        let row = *space.shape().last().unwrap();
        assert_eq!(chunks.len() as u64, space.num_elements() / row);
        assert!(chunks.iter().all(|chunk| chunk.nelems == row));
    }
    Ok(())
}
