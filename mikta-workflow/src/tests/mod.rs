mod worker_pool_tests;
