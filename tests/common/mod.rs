pub mod tracing_setup {
    use std::sync::Once;

    static TRACING_INIT: Once = Once::new();

    /// Installs a test subscriber once per process; later calls are no-ops.
    pub fn init_tracing() {
        TRACING_INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .with_test_writer()
                .try_init();
        });
    }
}

#[allow(dead_code)]
pub mod fixtures {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use webrpc::adapt::{AdaptError, SeqSource, Value};
    use webrpc::Adapt;

    /// Recursive shape shared by the adapter and typed-view suites.
    #[derive(Adapt, Clone, Debug, PartialEq)]
    pub struct TreeNode {
        pub name: String,
        pub children: Vec<TreeNode>,
    }

    impl TreeNode {
        pub fn new(name: &str, children: Vec<TreeNode>) -> Self {
            TreeNode {
                name: name.to_string(),
                children,
            }
        }

        pub fn leaf(name: &str) -> Self {
            TreeNode::new(name, Vec::new())
        }
    }

    /// Exercises key overrides and skipped fields.
    #[derive(Adapt, Clone, Debug)]
    pub struct Account {
        pub name: String,
        #[adapt(key = "URL")]
        pub url: String,
        pub active: bool,
        #[adapt(skip)]
        pub secret: String,
    }

    impl Account {
        pub fn sample() -> Self {
            Account {
                name: "maria".to_string(),
                url: "https://example.com/maria".to_string(),
                active: true,
                secret: "hunter2".to_string(),
            }
        }
    }

    /// Sequence source that counts how many element reads it has served.
    #[derive(Debug, Default)]
    pub struct CountingSource {
        items: Vec<i64>,
        pub reads: AtomicUsize,
    }

    impl CountingSource {
        pub fn new(items: Vec<i64>) -> Self {
            CountingSource {
                items,
                reads: AtomicUsize::new(0),
            }
        }
    }

    impl SeqSource for CountingSource {
        fn len(&self) -> usize {
            self.items.len()
        }

        fn get(&self, index: usize) -> Result<Value, AdaptError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            match self.items.get(index) {
                Some(item) => Ok(Value::Int(*item)),
                None => Err(AdaptError::OutOfBounds {
                    index,
                    len: self.items.len(),
                }),
            }
        }
    }
}
