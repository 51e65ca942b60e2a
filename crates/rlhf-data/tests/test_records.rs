use ndarray::{array, Array1};
use rlhf_data::prelude::*;

fn assert_round_trip<T: Record + PartialEq + std::fmt::Debug>(record: &T) {
    let flatten = make_flattener::<T>();
    let unflatten = make_unflattener::<T>();
    let fields = flatten(record).unwrap();
    assert_eq!(fields.len(), T::field_names().len());
    assert_eq!(&unflatten(fields).unwrap(), record);
}

fn assert_arity_checked<T: Record + std::fmt::Debug>(record: &T) {
    let n = T::arity();
    let fields = flatten(record).unwrap();

    let mut short = fields.clone();
    short.pop();
    match unflatten::<T>(short) {
        Err(DataError::ArityMismatch {
            expected, actual, ..
        }) => {
            assert_eq!(expected, n);
            assert_eq!(actual, n - 1);
        }
        other => panic!("expected arity mismatch, got {other:?}"),
    }

    let mut long = fields;
    long.push(FieldValue::Text("extra".into()));
    assert!(matches!(
        unflatten::<T>(long),
        Err(DataError::ArityMismatch { actual, .. }) if actual == n + 1
    ));

    assert!(matches!(
        unflatten::<T>(Vec::new()),
        Err(DataError::ArityMismatch { actual: 0, .. })
    ));
}

fn ppo(query: &[i64], response: &[i64]) -> PPORLElement {
    let n = response.len();
    PPORLElement::new(
        Array1::from(query.to_vec()),
        Array1::from(response.to_vec()),
        Array1::linspace(-1.0, 0.0, n),
        Array1::from_elem(n, 0.5),
        Array1::from_elem(n, 1.0),
    )
    .unwrap()
}

fn ilql() -> ILQLElement {
    ILQLElement::new(
        array![10, 11, 12, 13],
        array![1, 1, 1, 1],
        array![0.0, 1.0],
        array![1, 2, 3],
        array![1, 2],
        array![0, 0, 1],
    )
    .unwrap()
}

fn ilql_seq2seq() -> ILQLSeq2SeqElement {
    ILQLSeq2SeqElement::new(
        array![10, 11],
        array![1, 1],
        array![0, 20, 21],
        array![0.0, 1.0],
        array![0, 1, 2],
        array![0, 1],
        array![0, 0, 1],
    )
    .unwrap()
}

#[test]
fn test_round_trip_every_record_type() {
    assert_round_trip(&PromptElement::new("Hello there", array![1, 2, 3]));
    assert_round_trip(
        &PromptBatch::new(
            vec!["a".to_string(), "b".to_string()],
            array![[1, 2], [3, 4]],
        )
        .unwrap(),
    );
    assert_round_trip(&RLElement::new(array![1, 2], array![0.0, 1.0]).unwrap());
    assert_round_trip(&RLBatchElement::new(array![[1, 2]], array![[0.0, 1.0]]).unwrap());
    assert_round_trip(&ilql());
    assert_round_trip(&ILQLElement::stack(&[ilql(), ilql()]).unwrap());
    assert_round_trip(&ilql_seq2seq());
    assert_round_trip(&ILQLSeq2SeqElement::stack(&[ilql_seq2seq()]).unwrap());
    assert_round_trip(&ppo(&[1, 2, 3], &[4, 5]));
    assert_round_trip(&PPORLElement::stack(&[ppo(&[1], &[2]), ppo(&[3], &[4])]).unwrap());
}

#[test]
fn test_arity_checked_for_every_field_count() {
    assert_arity_checked(&PromptElement::new("p", array![1]));
    assert_arity_checked(&RLElement::new(array![1], array![0.0]).unwrap());
    assert_arity_checked(&ppo(&[1], &[2]));
    assert_arity_checked(&ilql());
    assert_arity_checked(&ilql_seq2seq());
    assert_arity_checked(&PPORLElement::stack(&[ppo(&[1], &[2])]).unwrap());
}

#[test]
fn test_field_names_preserved() {
    assert_eq!(PromptElement::field_names(), &["text", "tokens"]);
    assert_eq!(PromptBatch::field_names(), &["text", "tokens"]);
    assert_eq!(RLElement::field_names(), &["output_tokens", "rewards"]);
    assert_eq!(RLBatchElement::field_names(), &["output_tokens", "rewards"]);
    assert_eq!(
        ILQLElement::field_names(),
        &["input_ids", "attention_mask", "rewards", "states_ixs", "actions_ixs", "dones"]
    );
    assert_eq!(ILQLBatch::field_names(), ILQLElement::field_names());
    assert_eq!(
        ILQLSeq2SeqElement::field_names(),
        &[
            "input_ids",
            "attention_mask",
            "decoder_input_ids",
            "rewards",
            "states_ixs",
            "actions_ixs",
            "dones"
        ]
    );
    assert_eq!(ILQLSeq2SeqBatch::field_names(), ILQLSeq2SeqElement::field_names());
    assert_eq!(
        PPORLElement::field_names(),
        &["query_tensor", "response_tensor", "logprobs", "values", "rewards"]
    );
    assert_eq!(
        PPORLBatch::field_names(),
        &["query_tensors", "response_tensors", "logprobs", "values", "rewards"]
    );
}

#[test]
fn test_batch_adds_one_leading_dimension() {
    let elements: Vec<PPORLElement> = (0..4).map(|i| ppo(&[i, i + 1, i + 2], &[i; 5])).collect();
    let batch = PPORLElement::stack(&elements).unwrap();

    let element_fields = flatten(&elements[0]).unwrap();
    let batch_fields = flatten(&batch).unwrap();
    for (element_field, batch_field) in element_fields.iter().zip(&batch_fields) {
        let mut expected = vec![elements.len()];
        expected.extend(element_field.shape());
        assert_eq!(batch_field.shape(), expected);
    }
    assert_eq!(batch.unstack(), elements);
}

#[test]
fn test_unflatten_rejects_element_values_for_batch() {
    let element = ppo(&[1], &[2]);
    let err = unflatten::<PPORLBatch>(flatten(&element).unwrap()).unwrap_err();
    assert!(matches!(
        err,
        DataError::FieldType {
            record: "PPORLBatch",
            field: "query_tensors",
            expected: FieldKind::Long(2),
            actual: FieldKind::Long(1),
        }
    ));
}

#[test]
fn test_records_serialize_to_json() {
    let element = ppo(&[1, 2], &[3]);
    let json = serde_json::to_string(&element).unwrap();
    let restored: PPORLElement = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, element);
}

#[test]
fn test_flattener_is_shareable_across_threads() {
    let flatten = std::sync::Arc::new(make_flattener::<PPORLElement>());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let flatten = flatten.clone();
            std::thread::spawn(move || (*flatten)(&ppo(&[i], &[i, i])).unwrap().len())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 5);
    }
}
