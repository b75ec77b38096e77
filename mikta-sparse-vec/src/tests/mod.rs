mod sparse_vector_tests;
