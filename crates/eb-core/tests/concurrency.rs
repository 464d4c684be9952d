//! Two independent encodes running on separate threads must not interfere:
//! nothing in the codec uses global mutable state (spec §9 "Global mutable
//! counters" consolidates everything into a per-call `TraversalState`-style
//! struct rather than process-global storage).

use std::thread;

use eb_core::{encode_mesh, CompressionOptions, MeshData};

fn tetrahedron() -> MeshData {
    MeshData::new(
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ],
        vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
    )
}

fn open_square() -> MeshData {
    MeshData::new(
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ],
        vec![[0, 1, 2], [0, 2, 3]],
    )
}

#[test]
fn independent_encodes_on_separate_threads_agree_with_single_threaded_results() {
    let opts = CompressionOptions::uniform(1.0, 8).unwrap();
    let tet = tetrahedron();
    let square = open_square();

    let (tet_concurrent, square_concurrent) = thread::scope(|scope| {
        let tet_handle = scope.spawn(|| encode_mesh(&tet, opts).unwrap());
        let square_handle = scope.spawn(|| encode_mesh(&square, opts).unwrap());
        (tet_handle.join().unwrap(), square_handle.join().unwrap())
    });

    let tet_solo = encode_mesh(&tet, opts).unwrap();
    let square_solo = encode_mesh(&square, opts).unwrap();

    assert_eq!(tet_concurrent.history, tet_solo.history);
    assert_eq!(tet_concurrent.residuals, tet_solo.residuals);
    assert_eq!(square_concurrent.history, square_solo.history);
    assert_eq!(square_concurrent.residuals, square_solo.residuals);
}
