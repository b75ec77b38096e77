mod randomized_tests;
