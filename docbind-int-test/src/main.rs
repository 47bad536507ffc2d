use docbind::errors::DocBindResult;
use docbind::mapper::Mapper;
use docbind::params;
use docbind::query::Parameter;
use docbind_int_test::test_model::Friend;

fn main() -> DocBindResult<()> {
    println!("Starting binding stress test...");
    let mapper = Mapper::builder().build()?;

    let count = 1_000_000;

    let start = std::time::Instant::now();
    for i in 0..count {
        let query = mapper.create_query("{id:#, name:'#', active:#}", &params![i, "John", true])?;
        debug_assert!(!query.as_str().contains('#'));
    }
    println!("Bound {} primitive queries in {:?}", count, start.elapsed());

    let friend = Friend::random();
    let start = std::time::Instant::now();
    for _ in 0..count {
        mapper.create_query("{friend:#}", &[Parameter::object(&friend)])?;
    }
    println!("Bound {} marshalled queries in {:?}", count, start.elapsed());

    let start = std::time::Instant::now();
    for _ in 0..count / 10 {
        let mut friend = Friend::random();
        mapper.prepare_save(&mut friend)?;
    }
    println!("Prepared {} entities in {:?}", count / 10, start.elapsed());

    Ok(())
}
