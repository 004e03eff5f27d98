use std::collections::BTreeMap;

use serde_json::json;

use fractal_ledger::merkle::{build_merkle_tree_from_hashes, generate_proof, verify_proof};
use fractal_ledger::{
    create_genesis_block, transaction_digest, Block, BlockHeader, Coordinate,
    PlaceholderTransaction, Transaction, ZERO_HASH,
};

const H1: &str = "88266d2e12e45acd3fd66b458a1478a128f33d0852a09ec2fff4c436bf8331e5";
const H2: &str = "04907effdc616ba69ded46732af149c4d14a669cefec035a9ca3bcdf3615d606";
const ROOT: &str = "dfa25026de105a3b7845b74edd263451ceb19096fb5d79395662735413798338";
const BLOCK1_HASH: &str = "3aab61a73475946158cc20d66df6cf212cfcdb2931299e3e2631ee455deb7580";

fn scenario_transactions() -> Vec<Transaction> {
    vec![
        PlaceholderTransaction::new("tx1", json!({"value": 100})).into(),
        PlaceholderTransaction::new("tx2", json!({"value": 200})).into(),
    ]
}

fn scenario_header(merkle_root: String) -> BlockHeader {
    BlockHeader::new(ZERO_HASH, 1678886400.5, Coordinate::new(1, vec![1]).unwrap())
        .with_merkle_root(Some(merkle_root))
        .with_geometric_proof(Some(b"proof_for_block1".to_vec()))
        .with_nonce(12345)
}

#[test]
fn two_transaction_block_hashes_to_fixed_value() {
    let txs = scenario_transactions();
    let digests: Vec<String> = txs.iter().map(|tx| transaction_digest(tx).unwrap()).collect();
    assert_eq!(digests, [H1, H2]);

    let tree = build_merkle_tree_from_hashes(&digests).unwrap();
    assert_eq!(tree.value(), ROOT);

    let header = scenario_header(tree.value().to_string());
    assert_eq!(
        header.canonical_string(),
        format!(
            concat!(
                r#"{{"child_block_references":{{}},"coordinate_depth":1,"coordinate_path":[1],"depth":1,"#,
                r#""geometric_proof":"70726f6f665f666f725f626c6f636b31","merkle_root_transactions":"{}","#,
                r#""nonce":12345,"parent_hash":"{}","timestamp":1678886400.5}}"#
            ),
            ROOT, ZERO_HASH
        )
    );
    assert_eq!(header.calculate_hash(), BLOCK1_HASH);

    let block = Block::new(header, txs);
    assert_eq!(block.block_hash(), BLOCK1_HASH);
    assert_eq!(block.block_hash(), BLOCK1_HASH);
}

#[test]
fn assembled_block_matches_hand_built_header() {
    let block = Block::assemble(
        ZERO_HASH,
        1678886400.5,
        Coordinate::new(1, vec![1]).unwrap(),
        scenario_transactions(),
    )
    .unwrap();
    assert_eq!(block.header().merkle_root_transactions(), Some(ROOT));

    let mut block = block;
    block.header_mut().set_nonce(12345);
    let proofed = block
        .header()
        .clone()
        .with_geometric_proof(Some(b"proof_for_block1".to_vec()));
    assert_eq!(proofed.calculate_hash(), BLOCK1_HASH);
}

#[test]
fn transactions_are_provable_against_the_header_root() {
    let txs = scenario_transactions();
    let digests: Vec<String> = txs.iter().map(|tx| transaction_digest(tx).unwrap()).collect();
    let tree = build_merkle_tree_from_hashes(&digests).unwrap();
    let header = scenario_header(tree.value().to_string());
    let root = header.merkle_root_transactions().unwrap();

    for digest in &digests {
        let proof = generate_proof(&tree, digest).unwrap();
        assert!(verify_proof(digest, &proof, root));
    }
}

#[test]
fn non_ascii_child_reference_uses_escaped_encoding() {
    let header = BlockHeader::new(ZERO_HASH, 1678886400.0, Coordinate::root())
        .with_child_references(BTreeMap::from([(
            "0".to_string(),
            "h\u{e9}llo \u{1F600}".to_string(),
        )]));
    assert!(header
        .canonical_string()
        .contains(r#""child_block_references":{"0":"h\u00e9llo \ud83d\ude00"}"#));
    assert_eq!(
        header.calculate_hash(),
        "6c1cf8e98241899570fff403fb45c4be85cad05fdb238c2408daa1621d5f47f2"
    );
}

#[test]
fn parent_identity_changes_as_children_register() {
    let mut genesis = create_genesis_block(Coordinate::root());
    let snapshot = genesis.block_hash();

    let child_coord = Coordinate::root().child(1).unwrap();
    let child = Block::assemble(
        snapshot.clone(),
        genesis.header().timestamp() + 10.0,
        child_coord,
        scenario_transactions(),
    )
    .unwrap();
    assert_eq!(child.header().parent_hash(), snapshot);

    let slot = child.header().coordinate().child_index().unwrap();
    genesis.header_mut().add_child_reference(slot, child.block_hash());
    assert_ne!(genesis.block_hash(), snapshot);
    assert_eq!(genesis.header().child_block_references()["1"], child.block_hash());
}

#[test]
fn block_export_form_round_trips_header() {
    let mut header = scenario_header(ROOT.to_string());
    header.add_child_reference(2, "child2");
    header.add_child_reference(0, "child0");
    let block = Block::new(header, scenario_transactions());

    let text = serde_json::to_string(&block.to_dict().unwrap()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();

    let rebuilt = BlockHeader::from_dict(&parsed["header"]).unwrap();
    assert_eq!(&rebuilt, block.header());
    assert_eq!(rebuilt.calculate_hash(), block.block_hash());
    assert_eq!(parsed["transactions"][0], json!({"id": "tx1", "data": {"value": 100}}));
    assert_eq!(parsed["transactions"][1]["id"], json!("tx2"));
}
