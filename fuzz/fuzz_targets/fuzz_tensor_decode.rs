#![no_main]

use libfuzzer_sys::fuzz_target;
use tscope_core::tensor::{ElementType, Tensor};

fuzz_target!(|data: &[u8]| {
    // Byte 0 picks the element code, bytes 1..=3 the shape (rank 0..=3).
    if data.len() < 4 {
        return;
    }
    let Ok(element_type) = ElementType::from_code(i64::from(data[0] % 3)) else {
        return;
    };
    let rank = usize::from(data[1] % 4);
    let shape: Vec<usize> = data[1..4]
        .iter()
        .take(rank)
        .map(|&b| usize::from(b % 9))
        .collect();
    let payload = &data[4..];

    match Tensor::from_le_bytes(element_type, &shape, payload) {
        Ok(tensor) => {
            assert_eq!(tensor.shape(), shape.as_slice());
            assert_eq!(tensor.byte_len(), payload.len());
            assert_eq!(tensor.to_le_bytes(), payload);
        }
        Err(_) => {
            let count: usize = shape.iter().product();
            assert!(shape.contains(&0) || count * element_type.size() != payload.len());
        }
    }
});
