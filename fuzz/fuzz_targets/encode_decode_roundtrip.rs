#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use mpk_decoder::{MsgPackReader, Outcome, Value};
use mpk_encoder::MsgPackWriter;

#[derive(Debug, Arbitrary)]
enum FuzzValue {
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    F32(f32),
    F64(f64),
    Bin(Vec<u8>),
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    values: Vec<FuzzValue>,
    chunk_len: u8,
}

fn same_float(a: f64, b: f64) -> bool {
    a.to_bits() == b.to_bits()
}

// Fuzz target: MsgPackWriter -> MsgPackReader roundtrip.
//
// Anything the writer produces must decode back to the same values, in
// the same order, regardless of the chunk size. uint64 values above
// i64::MAX must be rejected rather than wrapped.
fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(input) = FuzzInput::arbitrary(&mut u) else {
        return;
    };

    let mut writer = MsgPackWriter::new();
    for value in &input.values {
        match value {
            FuzzValue::Nil => {
                writer.write_nil();
            }
            FuzzValue::Bool(b) => {
                writer.write_bool(*b);
            }
            FuzzValue::Int(i) => {
                writer.write_int(*i);
            }
            FuzzValue::Uint(u) => {
                writer.write_uint(*u);
            }
            FuzzValue::F32(f) => {
                writer.write_f32(*f);
            }
            FuzzValue::F64(f) => {
                writer.write_f64(*f);
            }
            FuzzValue::Bin(data) => {
                writer.write_bin(data).expect("fuzz blobs fit in bin32");
            }
        }
    }
    let payload = writer.finish();

    let mut reader = MsgPackReader::new().expect("1 MiB arena");
    let step = usize::from(input.chunk_len).max(1);
    let mut fed = 0;
    let mut expected = input.values.iter();

    loop {
        let want = match reader.read_value() {
            Ok(Outcome::NeedMoreData) => {
                if fed == payload.len() {
                    break;
                }
                let end = payload.len().min(fed + step);
                reader.feed(&payload[fed..end]).expect("feed");
                fed = end;
                continue;
            }
            Ok(Outcome::Decoded { value, .. }) => {
                let want = expected.next().expect("more values decoded than written");
                (value, want)
            }
            Err(e) => {
                let want = expected.next().expect("error past the last value");
                assert!(
                    matches!(want, FuzzValue::Uint(u) if *u > i64::MAX as u64),
                    "unexpected error {e} for {want:?}"
                );
                return;
            }
        };

        match want {
            (Value::Nil, FuzzValue::Nil) => {}
            (Value::Bool(got), FuzzValue::Bool(b)) => assert_eq!(got, *b),
            (Value::Int(got), FuzzValue::Int(i)) => assert_eq!(got, *i),
            (Value::Int(got), FuzzValue::Uint(u)) => assert_eq!(got as u64, *u),
            (Value::Float(got), FuzzValue::F32(f)) => assert!(same_float(got, f64::from(*f))),
            (Value::Float(got), FuzzValue::F64(f)) => assert!(same_float(got, *f)),
            (Value::Bin(view), FuzzValue::Bin(data)) => {
                assert_eq!(reader.view(view).expect("fresh view"), data.as_slice());
            }
            (got, want) => panic!("decoded {got:?} for {want:?}"),
        }
    }

    assert!(expected.next().is_none(), "values lost in decoding");
});
