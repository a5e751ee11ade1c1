mod cost_calculation_tests;
